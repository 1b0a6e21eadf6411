use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;

use crate::protocol::{ClientInfo, ConnectionId, Participant, ServerMessage};

/// Send side of one accepted connection.
///
/// Cloning is cheap; equality is by connection id only. Messages pushed here
/// are written to the socket in order by the connection's writer task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    remote_addr: SocketAddr,
    outbound: mpsc::Sender<Arc<ServerMessage>>,
    /// Generation of the newest roster queued on this connection
    roster_generation: Arc<Mutex<u64>>,
}

/// What happened to a roster offered to [`ConnectionHandle::send_roster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterDelivery {
    Queued,
    /// A roster at least this new was already queued; this one was discarded
    Superseded,
}

impl ConnectionHandle {
    pub fn new(remote_addr: SocketAddr, outbound: mpsc::Sender<Arc<ServerMessage>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote_addr,
            outbound,
            roster_generation: Arc::new(Mutex::new(0)),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Queue a message for this connection, waiting for room if the queue is full.
    ///
    /// Fails only once the connection's writer has gone away.
    pub async fn send(
        &self,
        message: Arc<ServerMessage>,
    ) -> Result<(), mpsc::error::SendError<Arc<ServerMessage>>> {
        self.outbound.send(message).await
    }

    /// Queue a roster taken at registry `generation`, unless a newer one is
    /// already queued.
    ///
    /// The check and the enqueue happen under this connection's own lock, so
    /// concurrent broadcasts reach the queue in generation order and the last
    /// roster a connection receives is the newest one sent to it.
    pub async fn send_roster(
        &self,
        message: Arc<ServerMessage>,
        generation: u64,
    ) -> Result<RosterDelivery, mpsc::error::SendError<Arc<ServerMessage>>> {
        let mut queued = self.roster_generation.lock().await;
        if generation <= *queued {
            return Ok(RosterDelivery::Superseded);
        }
        self.outbound.send(message).await?;
        *queued = generation;
        Ok(RosterDelivery::Queued)
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

#[derive(Debug, Clone)]
struct RegistryEntry {
    connection: ConnectionHandle,
    participant: Participant,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: Vec<RegistryEntry>,
    /// Bumped on every change to `entries`
    generation: u64,
}

/// Point-in-time roster together with the connections it goes to.
#[derive(Debug, Clone)]
pub struct RosterView {
    pub generation: u64,
    pub clients: Vec<ClientInfo>,
    pub recipients: Vec<ConnectionHandle>,
}

/// Live set of registered connections and the identity each one presents.
///
/// Entries keep registration order, which is also the order of `client_list`
/// broadcasts. All reads that return more than one entry are taken under a
/// single lock acquisition, so they never observe a half-applied mutation.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite the participant bound to `connection`.
    ///
    /// Other connections that already use the same `user_id` are left alone.
    pub async fn insert(
        &self,
        connection: &ConnectionHandle,
        user_id: impl Into<String>,
        display_name: impl Into<String>,
    ) {
        let participant = Participant::new(user_id, display_name);
        let mut state = self.state.write().await;
        match state
            .entries
            .iter_mut()
            .find(|entry| entry.connection.id == connection.id)
        {
            Some(existing) => existing.participant = participant,
            None => state.entries.push(RegistryEntry {
                connection: connection.clone(),
                participant,
            }),
        }
        state.generation += 1;
    }

    /// Rename a registered connection. Returns `false` if it is not registered.
    pub async fn update_name(
        &self,
        connection_id: &ConnectionId,
        display_name: impl Into<String>,
    ) -> bool {
        let mut state = self.state.write().await;
        let Some(entry) = state
            .entries
            .iter_mut()
            .find(|entry| entry.connection.id == *connection_id)
        else {
            return false;
        };
        entry.participant.display_name = display_name.into();
        state.generation += 1;
        true
    }

    /// Remove a connection, returning its participant if it was registered.
    ///
    /// Idempotent: the disconnect path and a failed broadcast may both call this.
    pub async fn remove(&self, connection_id: &ConnectionId) -> Option<Participant> {
        let mut state = self.state.write().await;
        let index = state
            .entries
            .iter()
            .position(|entry| entry.connection.id == *connection_id)?;
        state.generation += 1;
        Some(state.entries.remove(index).participant)
    }

    /// First live connection registered under `user_id`, in registration order.
    ///
    /// With duplicate `user_id`s this is the earliest surviving registrant.
    pub async fn find_by_user_id(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .find(|entry| entry.participant.user_id == user_id)
            .map(|entry| entry.connection.clone())
    }

    pub async fn participant(&self, connection_id: &ConnectionId) -> Option<Participant> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .find(|entry| entry.connection.id == *connection_id)
            .map(|entry| entry.participant.clone())
    }

    pub async fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.state
            .read()
            .await
            .entries
            .iter()
            .any(|entry| entry.connection.id == *connection_id)
    }

    /// `{id, name}` for every current entry.
    pub async fn snapshot(&self) -> Vec<ClientInfo> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .map(|entry| entry.participant.to_client_info())
            .collect()
    }

    /// Roster, recipients and generation, read under the same lock.
    pub async fn broadcast_view(&self) -> RosterView {
        let state = self.state.read().await;
        let (clients, recipients) = state
            .entries
            .iter()
            .map(|entry| {
                (
                    entry.participant.to_client_info(),
                    entry.connection.clone(),
                )
            })
            .unzip();
        RosterView {
            generation: state.generation,
            clients,
            recipients,
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}
