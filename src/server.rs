use crate::config::ServerConfig;
use crate::metrics::RelayMetrics;
use crate::protocol::ServerMessage;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

mod connection_registry;
mod message_router;
mod presence;

pub use connection_registry::{ConnectionHandle, ConnectionRegistry, RosterDelivery, RosterView};

/// Why a connection reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer sent a close frame or the stream ended cleanly
    PeerClosed,
    /// Reading from the transport failed (reset, protocol violation)
    TransportError,
    /// Writing to the transport failed
    SendFailed,
    /// The relay is shutting down
    ServerShutdown,
}

impl CloseReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PeerClosed => "peer_closed",
            Self::TransportError => "transport_error",
            Self::SendFailed => "send_failed",
            Self::ServerShutdown => "server_shutdown",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signaling relay state shared by every connection task.
///
/// Owns the participant registry, the relay counters and the shutdown
/// signal. Message routing lives in `message_router`, roster broadcasts in
/// `presence`.
pub struct SignalingServer {
    /// Live participants, in registration order
    registry: ConnectionRegistry,
    /// Limits applied to each connection
    config: ServerConfig,
    /// Relay counters exposed on `/metrics`
    metrics: Arc<RelayMetrics>,
    /// Cancelled once when the process starts shutting down
    shutdown: CancellationToken,
    /// Tracks upgraded connection tasks so shutdown can wait for their cleanup
    connections: TaskTracker,
}

impl SignalingServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Self::with_shutdown_token(config, CancellationToken::new())
    }

    /// Build a server that stops when `shutdown` is cancelled.
    pub fn with_shutdown_token(config: ServerConfig, shutdown: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            registry: ConnectionRegistry::new(),
            config,
            metrics: Arc::new(RelayMetrics::new()),
            shutdown,
            connections: TaskTracker::new(),
        })
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Get server metrics
    pub fn metrics(&self) -> Arc<RelayMetrics> {
        self.metrics.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Cancel every connection's receive wait and refuse new upgrades.
    pub fn begin_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!(
                active_connections = self.connections.len(),
                "Signaling relay shutting down"
            );
        }
        self.shutdown.cancel();
        self.connections.close();
    }

    /// Tracker that upgraded connection futures are spawned through.
    pub fn connection_tracker(&self) -> &TaskTracker {
        &self.connections
    }

    /// Wait for tracked connection tasks to finish their cleanup.
    ///
    /// Returns `false` if `grace` elapsed first.
    pub async fn wait_for_connections(&self, grace: Duration) -> bool {
        self.connections.close();
        let drained = tokio::time::timeout(grace, self.connections.wait())
            .await
            .is_ok();
        if !drained {
            tracing::warn!(
                remaining = self.connections.len(),
                grace_secs = grace.as_secs(),
                "Connections still open after shutdown grace period"
            );
        }
        drained
    }

    /// Create the outbound queue and handle for a freshly accepted connection.
    ///
    /// The connection is not in the registry until it sends `register`.
    pub fn open_connection(
        &self,
        remote_addr: SocketAddr,
    ) -> (ConnectionHandle, mpsc::Receiver<Arc<ServerMessage>>) {
        let (tx, rx) = mpsc::channel(self.config.outbound_queue_capacity.max(1));
        let handle = ConnectionHandle::new(remote_addr, tx);
        self.metrics.connection_opened();
        tracing::info!(
            connection_id = %handle.id(),
            client_addr = %remote_addr,
            "WebSocket connection established"
        );
        (handle, rx)
    }

    /// Closed-state cleanup: drop the connection from the registry and tell
    /// everyone who is left.
    ///
    /// The connection loop calls this exactly once per connection.
    pub async fn close_connection(&self, connection: &ConnectionHandle, reason: CloseReason) {
        let departed = self.registry.remove(&connection.id()).await;
        self.metrics.connection_closed();

        match &departed {
            Some(participant) => tracing::info!(
                connection_id = %connection.id(),
                client_addr = %connection.remote_addr(),
                user_id = %participant.user_id,
                reason = %reason,
                "Client unregistered"
            ),
            None => tracing::info!(
                connection_id = %connection.id(),
                client_addr = %connection.remote_addr(),
                reason = %reason,
                "Unregistered connection closed"
            ),
        }

        self.broadcast_client_list().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ClientInfo;
    use tokio::time::timeout;

    fn addr() -> SocketAddr {
        "10.0.0.5:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn close_connection_removes_entry_and_broadcasts() {
        let server = SignalingServer::new(ServerConfig::default());
        let (alice, mut alice_rx) = server.open_connection(addr());
        let (bob, mut bob_rx) = server.open_connection(addr());
        server.registry().insert(&alice, "alice", "alice").await;
        server.registry().insert(&bob, "bob", "bob").await;

        server.close_connection(&alice, CloseReason::PeerClosed).await;

        let message = timeout(Duration::from_secs(1), bob_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            *message,
            ServerMessage::client_list(vec![ClientInfo {
                id: "bob".to_string(),
                name: "bob".to_string()
            }])
        );
        assert!(alice_rx.try_recv().is_err());

        let snapshot = server.metrics().snapshot();
        assert_eq!(snapshot.total_connections, 2);
        assert_eq!(snapshot.active_connections, 1);
    }

    #[tokio::test]
    async fn closing_unregistered_connection_delivers_current_roster_once() {
        let server = SignalingServer::new(ServerConfig::default());
        let (observer, mut observer_rx) = server.open_connection(addr());
        let (anonymous, _rx) = server.open_connection(addr());
        let (another, _another_rx) = server.open_connection(addr());
        server.registry().insert(&observer, "carol", "Carol").await;

        server
            .close_connection(&anonymous, CloseReason::TransportError)
            .await;

        let message = timeout(Duration::from_secs(1), observer_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.message_type(), "client_list");

        // The roster has not changed since, so the observer is not sent it again.
        server
            .close_connection(&another, CloseReason::PeerClosed)
            .await;
        assert!(observer_rx.try_recv().is_err());
        assert_eq!(server.metrics().snapshot().active_connections, 1);
    }

    #[tokio::test]
    async fn begin_shutdown_cancels_token() {
        let server = SignalingServer::new(ServerConfig::default());
        let token = server.shutdown_token();
        assert!(!server.is_shutting_down());

        server.begin_shutdown();
        assert!(token.is_cancelled());
        assert!(server.is_shutting_down());
        assert!(server.wait_for_connections(Duration::from_millis(50)).await);
    }

    #[test]
    fn close_reason_labels() {
        assert_eq!(CloseReason::PeerClosed.to_string(), "peer_closed");
        assert_eq!(CloseReason::ServerShutdown.as_str(), "server_shutdown");
    }
}
