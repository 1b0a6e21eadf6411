//! Default value functions for configuration fields.
//!
//! These back the `#[serde(default = ...)]` attributes throughout the
//! configuration system so a partial JSON document always resolves to a
//! complete [`super::Config`].

use super::logging::LogFormat;
use super::security::TlsMode;

// =============================================================================
// Root Config
// =============================================================================

pub const fn default_port() -> u16 {
    8765
}

pub fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

// =============================================================================
// Relay Defaults
// =============================================================================

pub const fn default_max_message_size() -> usize {
    65536 // 64KB
}

pub const fn default_outbound_queue_capacity() -> usize {
    64
}

pub const fn default_close_timeout_secs() -> u64 {
    5
}

pub const fn default_shutdown_grace_period_secs() -> u64 {
    10
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "signaling.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Text
}

// =============================================================================
// Security Defaults
// =============================================================================

pub fn default_cors_origins() -> String {
    "*".to_string()
}

pub const fn default_tls_mode() -> TlsMode {
    TlsMode::Auto
}

pub fn default_certificate_path() -> String {
    "server.crt".to_string()
}

pub fn default_private_key_path() -> String {
    "server.key".to_string()
}

pub const fn default_certificate_validity_days() -> u32 {
    365
}

// =============================================================================
// Static File Server Defaults
// =============================================================================

pub const fn default_static_files_enabled() -> bool {
    true
}

pub const fn default_static_files_port() -> u16 {
    8443
}

pub fn default_static_files_root() -> String {
    "static".to_string()
}
