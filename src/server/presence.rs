use std::sync::Arc;

use super::SignalingServer;
use crate::broadcast::fan_out;
use crate::protocol::ServerMessage;

impl SignalingServer {
    /// Push the current roster to every registered connection.
    ///
    /// Recipients whose queue is closed are dropped from the registry. That
    /// removal does not trigger another broadcast; the departed connection's
    /// own cleanup announces it.
    pub async fn broadcast_client_list(&self) {
        let view = self.registry.broadcast_view().await;
        if view.recipients.is_empty() {
            return;
        }

        let participant_count = view.clients.len();
        let message = Arc::new(ServerMessage::client_list(view.clients));
        let outcome = fan_out(&view.recipients, message, view.generation).await;
        self.metrics.increment_broadcasts();

        if outcome.all_delivered() {
            tracing::debug!(
                participants = participant_count,
                generation = view.generation,
                recipients = outcome.delivered,
                superseded = outcome.superseded,
                "Client list broadcast"
            );
            return;
        }

        self.metrics
            .add_broadcast_send_failures(outcome.failed.len() as u64);
        for connection_id in &outcome.failed {
            if let Some(participant) = self.registry.remove(connection_id).await {
                tracing::warn!(
                    %connection_id,
                    user_id = %participant.user_id,
                    "Client list send failed, removing connection from registry"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ServerConfig;
    use crate::protocol::{ClientInfo, ServerMessage};
    use crate::server::SignalingServer;
    use std::net::SocketAddr;

    fn addr() -> SocketAddr {
        "192.168.0.10:5000".parse().unwrap()
    }

    #[tokio::test]
    async fn roster_reaches_every_registered_connection() {
        let server = SignalingServer::new(ServerConfig::default());
        let (a, mut ra) = server.open_connection(addr());
        let (b, mut rb) = server.open_connection(addr());
        server.registry().insert(&a, "alice", "Alice").await;
        server.registry().insert(&b, "bob", "bob").await;

        server.broadcast_client_list().await;

        let expected = ServerMessage::client_list(vec![
            ClientInfo {
                id: "alice".to_string(),
                name: "Alice".to_string(),
            },
            ClientInfo {
                id: "bob".to_string(),
                name: "bob".to_string(),
            },
        ]);
        assert_eq!(*ra.recv().await.unwrap(), expected);
        assert_eq!(*rb.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn failed_recipients_are_removed_without_rebroadcast() {
        let server = SignalingServer::new(ServerConfig::default());
        let (alive, mut alive_rx) = server.open_connection(addr());
        let (dead, dead_rx) = server.open_connection(addr());
        server.registry().insert(&alive, "alice", "alice").await;
        server.registry().insert(&dead, "ghost", "ghost").await;
        drop(dead_rx);

        server.broadcast_client_list().await;

        // The in-flight roster still lists the dead connection.
        let first = alive_rx.recv().await.unwrap();
        match first.as_ref() {
            ServerMessage::ClientList(list) => assert_eq!(list.clients.len(), 2),
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(alive_rx.try_recv().is_err(), "no second broadcast");
        assert!(!server.registry().contains(&dead.id()).await);
        assert_eq!(server.metrics().snapshot().broadcast_send_failures, 1);
    }

    #[tokio::test]
    async fn empty_registry_skips_broadcast() {
        let server = SignalingServer::new(ServerConfig::default());
        server.broadcast_client_list().await;
        assert_eq!(server.metrics().snapshot().broadcasts, 0);
    }
}
