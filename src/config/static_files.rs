//! Static asset server configuration.

use super::defaults::{
    default_static_files_enabled, default_static_files_port, default_static_files_root,
};
use serde::{Deserialize, Serialize};

/// Configuration for the HTTPS server that hosts the browser client.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StaticFilesConfig {
    #[serde(default = "default_static_files_enabled")]
    pub enabled: bool,
    #[serde(default = "default_static_files_port")]
    pub port: u16,
    /// Directory whose contents are served
    #[serde(default = "default_static_files_root")]
    pub root: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_files_enabled(),
            port: default_static_files_port(),
            root: default_static_files_root(),
        }
    }
}
