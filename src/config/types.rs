//! Root configuration types.

use super::defaults::{default_bind_address, default_port};
use super::logging::LoggingConfig;
use super::security::SecurityConfig;
use super::server::ServerConfig;
use super::static_files::StaticFilesConfig;
use serde::{Deserialize, Serialize};

/// Root configuration struct.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Port of the signaling relay
    #[serde(default = "default_port")]
    pub port: u16,
    /// Interface both listeners bind to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
            static_files: StaticFilesConfig::default(),
        }
    }
}
