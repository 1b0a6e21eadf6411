use std::sync::Arc;

use crate::protocol::{ClientMessage, DecodeError, Participant, ServerMessage, SignalEnvelope};

use super::{ConnectionHandle, SignalingServer};

impl SignalingServer {
    /// Decode and dispatch one inbound text frame.
    ///
    /// Oversized or undecodable frames are logged and dropped; the connection
    /// stays open either way.
    pub async fn handle_text_frame(&self, connection: &ConnectionHandle, text: &str) {
        if self.exceeds_size_limit(connection, text.len()) {
            return;
        }
        match ClientMessage::decode(text) {
            Ok(message) => self.handle_client_message(connection, message).await,
            Err(err) => self.reject_frame(connection, &err),
        }
    }

    /// Binary frames carry the same UTF-8 JSON envelope as text frames.
    pub async fn handle_binary_frame(&self, connection: &ConnectionHandle, payload: &[u8]) {
        if self.exceeds_size_limit(connection, payload.len()) {
            return;
        }
        match ClientMessage::decode_bytes(payload) {
            Ok(message) => self.handle_client_message(connection, message).await,
            Err(err) => self.reject_frame(connection, &err),
        }
    }

    /// Dispatch a decoded client message.
    pub async fn handle_client_message(&self, connection: &ConnectionHandle, message: ClientMessage) {
        tracing::trace!(
            connection_id = %connection.id(),
            message_type = message.message_type(),
            "Client message received"
        );
        match message {
            ClientMessage::Register { user_id, name } => {
                self.register(connection, user_id, name).await;
            }
            ClientMessage::UpdateName { user_id, name } => {
                self.update_name(connection, user_id, name).await;
            }
            ClientMessage::Signal(envelope) => {
                self.relay_signal(connection, envelope).await;
            }
            ClientMessage::Unknown { message_type } => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    %message_type,
                    "Ignoring unrecognized message type"
                );
            }
        }
    }

    async fn register(&self, connection: &ConnectionHandle, user_id: String, name: String) {
        tracing::info!(
            connection_id = %connection.id(),
            client_addr = %connection.remote_addr(),
            %user_id,
            display_name = %name,
            "Client registered"
        );
        self.registry.insert(connection, user_id, name).await;
        self.metrics.increment_registrations();
        self.broadcast_client_list().await;
    }

    async fn update_name(
        &self,
        connection: &ConnectionHandle,
        user_id: Option<String>,
        name: String,
    ) {
        // The rename applies to the sending connection; `user_id` is informational.
        if !self.registry.update_name(&connection.id(), name.as_str()).await {
            tracing::debug!(
                connection_id = %connection.id(),
                user_id = user_id.as_deref().unwrap_or_default(),
                "Ignoring update_name from unregistered connection"
            );
            return;
        }

        tracing::info!(
            connection_id = %connection.id(),
            user_id = user_id.as_deref().unwrap_or_default(),
            display_name = %name,
            "Client updated name"
        );
        self.metrics.increment_name_updates();
        self.broadcast_client_list().await;
    }

    async fn relay_signal(&self, connection: &ConnectionHandle, envelope: SignalEnvelope) {
        let message_type = envelope.kind();
        let Some(target_id) = envelope.target_id().map(str::to_owned) else {
            tracing::warn!(
                connection_id = %connection.id(),
                %message_type,
                "Dropping signal without target_id"
            );
            self.metrics.increment_signals_dropped();
            return;
        };

        let sender = self
            .registry
            .participant(&connection.id())
            .await
            .unwrap_or_else(Participant::unknown);

        let Some(target) = self.registry.find_by_user_id(&target_id).await else {
            tracing::warn!(
                connection_id = %connection.id(),
                user_id = %sender.user_id,
                %target_id,
                %message_type,
                "Signal target not registered, dropping"
            );
            self.metrics.increment_signals_dropped();
            return;
        };

        let forwarded = Arc::new(ServerMessage::Signal(envelope.with_sender(&sender)));
        match target.send(forwarded).await {
            Ok(()) => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    user_id = %sender.user_id,
                    %target_id,
                    %message_type,
                    "Signal forwarded"
                );
                self.metrics.increment_signals_forwarded();
            }
            Err(_) => {
                // The target's own cleanup will broadcast its departure.
                tracing::warn!(
                    connection_id = %connection.id(),
                    user_id = %sender.user_id,
                    %target_id,
                    %message_type,
                    "Signal target connection closed, dropping message"
                );
                self.metrics.increment_forward_failures();
                self.registry.remove(&target.id()).await;
            }
        }
    }

    fn exceeds_size_limit(&self, connection: &ConnectionHandle, size: usize) -> bool {
        let max_size = self.config.max_message_size;
        if size <= max_size {
            return false;
        }
        tracing::warn!(
            connection_id = %connection.id(),
            size,
            max = max_size,
            "Message exceeds size limit, dropping"
        );
        self.metrics.increment_oversized_frames();
        true
    }

    fn reject_frame(&self, connection: &ConnectionHandle, err: &DecodeError) {
        tracing::warn!(
            connection_id = %connection.id(),
            client_addr = %connection.remote_addr(),
            error = %err,
            "Rejected client WebSocket frame"
        );
        self.metrics.increment_decode_errors();
    }
}
