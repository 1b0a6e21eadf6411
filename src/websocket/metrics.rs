use crate::server::SignalingServer;
use axum::extract::State;
use axum::response::Json;
use std::sync::Arc;

/// Metrics endpoint: relay counters plus the live participant count.
pub async fn metrics_handler(State(server): State<Arc<SignalingServer>>) -> Json<serde_json::Value> {
    let snapshot = server.metrics().snapshot();
    let participants = server.registry().len().await;

    Json(serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "participants": participants,
        "shuttingDown": server.is_shutting_down(),
        "serverMetrics": {
            "connections": {
                "total": snapshot.total_connections,
                "active": snapshot.active_connections,
                "disconnections": snapshot.disconnections,
            },
            "registry": {
                "registrations": snapshot.registrations,
                "nameUpdates": snapshot.name_updates,
            },
            "routing": {
                "signalsForwarded": snapshot.signals_forwarded,
                "signalsDropped": snapshot.signals_dropped,
                "forwardFailures": snapshot.forward_failures,
            },
            "broadcasts": {
                "sent": snapshot.broadcasts,
                "sendFailures": snapshot.broadcast_send_failures,
            },
            "errors": {
                "decodeErrors": snapshot.decode_errors,
                "oversizedFrames": snapshot.oversized_frames,
                "panicsContained": snapshot.panics_contained,
            },
        },
    }))
}
