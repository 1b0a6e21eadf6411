use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::error::DecodeError;
use super::types::{
    ClientInfo, Participant, SignalKind, DEFAULT_USER_ID, SENDER_ID_FIELD, SENDER_NAME_FIELD,
    TARGET_ID_FIELD,
};

/// Message types sent from client to relay.
///
/// The wire format is a flat JSON object with a `type` tag, e.g.
/// `{"type":"register","user_id":"alice","name":"Alice's laptop"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Bind a participant identity to the sending connection
    Register { user_id: String, name: String },
    /// Change the display name of the sending connection
    UpdateName {
        user_id: Option<String>,
        name: String,
    },
    /// Directed handshake message forwarded to `target_id`
    Signal(SignalEnvelope),
    /// A `type` the relay does not know; ignored
    Unknown { message_type: String },
}

impl ClientMessage {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(fields) = value else {
            return Err(DecodeError::NotAnObject);
        };
        Self::from_fields(fields)
    }

    /// Decode a binary frame carrying UTF-8 JSON.
    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(std::str::from_utf8(bytes)?)
    }

    fn from_fields(fields: Map<String, Value>) -> Result<Self, DecodeError> {
        let message_type = match fields.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            _ => return Err(DecodeError::MissingType),
        };

        match message_type.as_str() {
            "register" => {
                let user_id = non_empty_string(&fields, "user_id")?
                    .unwrap_or_else(|| DEFAULT_USER_ID.to_string());
                let name = non_empty_string(&fields, "name")?.unwrap_or_else(|| user_id.clone());
                Ok(Self::Register { user_id, name })
            }
            "update_name" => {
                let user_id = non_empty_string(&fields, "user_id")?;
                let name = non_empty_string(&fields, "name")?
                    .or_else(|| user_id.clone())
                    .ok_or(DecodeError::MissingField {
                        message_type: "update_name",
                        field: "name",
                    })?;
                Ok(Self::UpdateName { user_id, name })
            }
            other => match SignalKind::from_type_tag(other) {
                Some(kind) => {
                    let target_id = non_empty_string(&fields, TARGET_ID_FIELD)?;
                    Ok(Self::Signal(SignalEnvelope {
                        kind,
                        target_id,
                        fields,
                    }))
                }
                None => Ok(Self::Unknown { message_type }),
            },
        }
    }

    /// The `type` tag as it appeared on the wire.
    pub fn message_type(&self) -> &str {
        match self {
            Self::Register { .. } => "register",
            Self::UpdateName { .. } => "update_name",
            Self::Signal(envelope) => envelope.kind.as_str(),
            Self::Unknown { message_type } => message_type,
        }
    }
}

/// Reads an optional string field; absent, `null` and `""` all count as unset.
fn non_empty_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, DecodeError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(DecodeError::InvalidField { field }),
    }
}

/// A directed signal kept as the client sent it.
///
/// The payload (SDP, candidates, ...) belongs to the peers; the relay only
/// reads `type`/`target_id` and adds the sender identity before forwarding.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEnvelope {
    kind: SignalKind,
    target_id: Option<String>,
    fields: Map<String, Value>,
}

impl SignalEnvelope {
    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target_id.as_deref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Stamp `sender_id`/`sender_name`, overwriting anything the client put there.
    #[must_use]
    pub fn with_sender(mut self, sender: &Participant) -> Self {
        self.fields.insert(
            SENDER_ID_FIELD.to_string(),
            Value::String(sender.user_id.clone()),
        );
        self.fields.insert(
            SENDER_NAME_FIELD.to_string(),
            Value::String(sender.display_name.clone()),
        );
        self
    }
}

impl Serialize for SignalEnvelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.fields.serialize(serializer)
    }
}

/// Participant roster pushed to every registered connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "client_list")]
pub struct ClientList {
    pub clients: Vec<ClientInfo>,
}

/// Message types sent from relay to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    ClientList(ClientList),
    Signal(SignalEnvelope),
}

impl ServerMessage {
    pub fn client_list(clients: Vec<ClientInfo>) -> Self {
        Self::ClientList(ClientList { clients })
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            Self::ClientList(_) => "client_list",
            Self::Signal(envelope) => envelope.kind.as_str(),
        }
    }
}
