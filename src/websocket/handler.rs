use crate::server::SignalingServer;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;

use super::connection::handle_socket;

/// WebSocket handler for the signaling protocol
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(server): State<Arc<SignalingServer>>,
) -> Response {
    if server.is_shutting_down() {
        tracing::debug!(client_addr = %addr, "Rejecting WebSocket upgrade during shutdown");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    // Upgraded connections run outside the HTTP service, so track them for shutdown.
    let tracker = server.connection_tracker().clone();
    ws.on_upgrade(move |socket| tracker.track_future(handle_socket(socket, server, addr)))
}
