use crate::protocol::{ConnectionId, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;

/// Serialize and write one message as a JSON text frame.
///
/// A message that cannot be serialized is logged and skipped; only a failed
/// socket write is reported to the caller.
pub(super) async fn send_text_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
    connection_id: &ConnectionId,
) -> Result<(), axum::Error> {
    let json_message = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(
                %connection_id,
                message_type = message.message_type(),
                "Failed to serialize message: {}",
                e
            );
            return Ok(());
        }
    };

    sender.send(Message::Text(json_message.into())).await
}
