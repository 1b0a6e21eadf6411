use crate::server::SignalingServer;
use axum::extract::State;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handler::websocket_handler;
use super::metrics::metrics_handler;

/// Create the Axum router with WebSocket support
///
/// Browsers connect on `/`; `/ws` is accepted as an alias.
pub fn create_router(cors_origins: &str) -> axum::Router<Arc<SignalingServer>> {
    axum::Router::new()
        .route("/", get(websocket_handler))
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(build_cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Parse a comma-separated origin list, or `*` for any origin.
pub fn build_cors_layer(cors_origins: &str) -> CorsLayer {
    if cors_origins.trim() == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<_> = cors_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("No valid CORS origins configured, using permissive CORS");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Health check endpoint
async fn health_check(
    State(server): State<Arc<SignalingServer>>,
) -> axum::response::Result<&'static str> {
    if server.is_shutting_down() {
        Err(axum::http::StatusCode::SERVICE_UNAVAILABLE.into())
    } else {
        Ok("OK")
    }
}
