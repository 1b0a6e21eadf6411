// WebSocket module - organized into focused submodules
//
// - handler: WebSocket upgrade handler (entry point)
// - connection: Per-connection receive loop and writer task
// - sending: Message serialization and sending functions
// - routes: HTTP route setup (websocket, health, metrics)
// - metrics: JSON metrics endpoint

mod connection;
mod handler;
mod metrics;
mod routes;
mod sending;

pub use handler::websocket_handler;
pub use metrics::metrics_handler;
pub use routes::{build_cors_layer, create_router};
