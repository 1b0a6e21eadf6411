//! Security and transport configuration types.

use super::defaults::{
    default_certificate_path, default_certificate_validity_days, default_cors_origins,
    default_private_key_path, default_tls_mode,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Security configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Allowed CORS origins (comma-separated, or "*" for any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    /// TLS settings shared by the relay and the static file server
    #[serde(default)]
    pub tls: TlsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            tls: TlsConfig::default(),
        }
    }
}

/// When to terminate TLS on the listeners.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Use TLS when both the certificate and key files exist, plain TCP otherwise.
    #[default]
    Auto,
    /// Refuse to start without a usable certificate/key pair.
    Required,
    /// Always serve plain TCP.
    Disabled,
}

/// TLS server configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TlsConfig {
    #[serde(default = "default_tls_mode")]
    pub mode: TlsMode,
    /// Path to the PEM-encoded certificate presented to clients.
    #[serde(default = "default_certificate_path")]
    pub certificate_path: String,
    /// Path to the PEM-encoded private key for the certificate.
    #[serde(default = "default_private_key_path")]
    pub private_key_path: String,
    /// Generate a self-signed pair at startup when either file is missing.
    #[serde(default)]
    pub generate_if_missing: bool,
    /// Validity period of generated certificates (days).
    #[serde(default = "default_certificate_validity_days")]
    pub certificate_validity_days: u32,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            mode: default_tls_mode(),
            certificate_path: default_certificate_path(),
            private_key_path: default_private_key_path(),
            generate_if_missing: false,
            certificate_validity_days: default_certificate_validity_days(),
        }
    }
}

impl TlsConfig {
    /// Both PEM files are present on disk.
    pub fn files_present(&self) -> bool {
        Path::new(&self.certificate_path).is_file() && Path::new(&self.private_key_path).is_file()
    }
}
