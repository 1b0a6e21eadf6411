use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// `user_id` assumed for a `register` message that does not carry one.
pub const DEFAULT_USER_ID: &str = "Anonymous";

/// Identity attached to signals relayed from a connection that never registered.
pub const UNKNOWN_SENDER: &str = "unknown";

/// Field names the relay injects into forwarded signals.
pub const SENDER_ID_FIELD: &str = "sender_id";
pub const SENDER_NAME_FIELD: &str = "sender_name";
pub const TARGET_ID_FIELD: &str = "target_id";

/// Opaque identifier for one accepted transport connection.
pub type ConnectionId = Uuid;

/// One entry of a `client_list` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// The participant's self-declared `user_id`
    pub id: String,
    /// Current display name (defaults to `id`)
    pub name: String,
}

/// The identity a registered connection presents to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: String,
    pub display_name: String,
}

impl Participant {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Placeholder identity used when an unregistered connection sends a directed message.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_SENDER, UNKNOWN_SENDER)
    }

    pub fn to_client_info(&self) -> ClientInfo {
        ClientInfo {
            id: self.user_id.clone(),
            name: self.display_name.clone(),
        }
    }
}

/// Directed handshake messages the relay forwards without interpreting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    Hangup,
}

impl SignalKind {
    pub const ALL: [Self; 4] = [Self::Offer, Self::Answer, Self::IceCandidate, Self::Hangup];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice_candidate",
            Self::Hangup => "hangup",
        }
    }

    pub fn from_type_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
