use crate::protocol::{ConnectionId, ServerMessage};
use crate::server::{CloseReason, ConnectionHandle, SignalingServer};
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{FutureExt, SinkExt, StreamExt};
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::sending::send_text_message;

/// Drive one accepted WebSocket from `Connected` to `Closed`.
///
/// Inbound frames are handled strictly in arrival order on this task. A
/// separate writer task drains the connection's outbound queue so a slow
/// socket never blocks the sender of a forwarded message for longer than the
/// queue takes to fill.
pub(super) async fn handle_socket(
    socket: WebSocket,
    server: Arc<SignalingServer>,
    addr: SocketAddr,
) {
    let (sink, mut stream) = socket.split();
    let (connection, outbound) = server.open_connection(addr);
    let connection_id = connection.id();
    let shutdown = server.shutdown_token();

    let writer_stopped = CancellationToken::new();
    let mut send_task = tokio::spawn(write_outbound(
        sink,
        outbound,
        connection_id,
        writer_stopped.clone().drop_guard(),
    ));

    let reason = loop {
        tokio::select! {
            biased;

            () = shutdown.cancelled() => break CloseReason::ServerShutdown,
            () = writer_stopped.cancelled() => break CloseReason::SendFailed,
            frame = stream.next() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        tracing::warn!(%connection_id, client_addr = %addr, "WebSocket error: {}", e);
                        break CloseReason::TransportError;
                    }
                    None => break CloseReason::PeerClosed,
                };

                match message {
                    Message::Text(_) | Message::Binary(_) => {
                        dispatch_contained(&server, &connection, message).await;
                    }
                    Message::Close(_) => break CloseReason::PeerClosed,
                    // Ping/pong replies are handled by the WebSocket layer.
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
        }
    };

    server.close_connection(&connection, reason).await;

    // Dropping the last local sender lets the writer flush what is queued and
    // send a close frame.
    drop(connection);
    let close_timeout = Duration::from_secs(server.config().close_timeout_secs);
    if tokio::time::timeout(close_timeout, &mut send_task).await.is_err() {
        tracing::debug!(%connection_id, "Writer did not drain in time, aborting");
        send_task.abort();
    }
}

/// Run one frame's handling, containing any panic to that frame.
async fn dispatch_contained(
    server: &SignalingServer,
    connection: &ConnectionHandle,
    frame: Message,
) {
    let handling = async {
        match &frame {
            Message::Text(text) => server.handle_text_frame(connection, text.as_str()).await,
            Message::Binary(payload) => server.handle_binary_frame(connection, payload).await,
            _ => {}
        }
    };
    let outcome = AssertUnwindSafe(handling).catch_unwind().await;

    if let Err(panic) = outcome {
        let detail = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        tracing::error!(
            connection_id = %connection.id(),
            panic = %detail,
            "Panic while handling client message; connection kept open"
        );
        server.metrics().increment_panics_contained();
    }
}

async fn write_outbound(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Arc<ServerMessage>>,
    connection_id: ConnectionId,
    _stopped: DropGuard,
) {
    while let Some(message) = outbound.recv().await {
        if let Err(e) = send_text_message(&mut sender, &message, &connection_id).await {
            tracing::warn!(%connection_id, error = %e, "Failed to send message, connection closed");
            return;
        }
    }

    let _ = sender.close().await;
}
