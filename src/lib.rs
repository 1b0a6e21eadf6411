#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # LAN Call Signaling
//!
//! A minimal WebSocket signaling relay for browser-to-browser voice calls on
//! a local network. Peers register under a self-chosen id, see who else is
//! present through `client_list` broadcasts, and exchange WebRTC offers,
//! answers and ICE candidates through the relay. Media never touches it.

/// Concurrent fan-out of one message to many connections
pub mod broadcast;

/// Server configuration and environment variables
pub mod config;

/// Structured logging configuration
pub mod logging;

/// Relay counters
pub mod metrics;

/// LAN address discovery
pub mod network;

/// WebSocket message protocol definitions
pub mod protocol;

/// TLS configuration and self-signed certificates
pub mod security;

/// Participant registry, message routing and connection lifecycle
pub mod server;

/// HTTPS host for the browser client
pub mod static_site;

/// Listener setup shared by the relay and the static site
pub mod transport;

/// WebSocket connection handling
pub mod websocket;
