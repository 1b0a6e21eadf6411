//! Configuration module.
//!
//! Layered JSON configuration with environment overrides and compiled defaults.
//!
//! # Module Structure
//!
//! - [`crate::config::types`]: Root `Config` struct
//! - [`server`]: Relay connection handling
//! - [`security`]: CORS and TLS settings
//! - [`static_files`]: Static asset server
//! - [`logging`]: Logging configuration
//! - [`crate::config::loader`]: Configuration loading functions
//! - [`crate::config::validation`]: Configuration validation functions
//! - [`crate::config::defaults`]: Default value functions

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod security;
pub mod server;
pub mod static_files;
pub mod types;
pub mod validation;

pub use loader::load;

pub use logging::{LogFormat, LogLevel, LoggingConfig};

pub use security::{SecurityConfig, TlsConfig, TlsMode};

pub use server::ServerConfig;

pub use static_files::StaticFilesConfig;

pub use types::Config;

pub use validation::validate_config;
