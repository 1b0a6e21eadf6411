//! Relay behavior configuration types.

use super::defaults::{
    default_close_timeout_secs, default_max_message_size, default_outbound_queue_capacity,
    default_shutdown_grace_period_secs,
};
use serde::{Deserialize, Serialize};

/// Relay configuration for connection handling.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Inbound frames larger than this (bytes) are dropped
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Depth of each connection's outbound queue
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Time a closing connection may spend flushing queued messages (seconds)
    #[serde(default = "default_close_timeout_secs")]
    pub close_timeout_secs: u64,
    /// Time to wait for connection cleanup after a shutdown signal (seconds)
    #[serde(default = "default_shutdown_grace_period_secs")]
    pub shutdown_grace_period_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            close_timeout_secs: default_close_timeout_secs(),
            shutdown_grace_period_secs: default_shutdown_grace_period_secs(),
        }
    }
}
