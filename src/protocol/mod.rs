// Protocol module: envelope decoding and server message types

pub mod error;
pub mod messages;
pub mod types;

pub use error::DecodeError;

pub use types::{
    ClientInfo, ConnectionId, Participant, SignalKind, DEFAULT_USER_ID, SENDER_ID_FIELD,
    SENDER_NAME_FIELD, TARGET_ID_FIELD, UNKNOWN_SENDER,
};

pub use messages::{ClientList, ClientMessage, ServerMessage, SignalEnvelope};
