use thiserror::Error;

/// Reasons an inbound frame could not be decoded into a [`super::ClientMessage`].
///
/// Decode errors are logged and the frame is dropped; they never close the connection.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("envelope must be a JSON object")]
    NotAnObject,

    #[error("envelope has no string `type` field")]
    MissingType,

    #[error("field `{field}` must be a string")]
    InvalidField { field: &'static str },

    #[error("`{message_type}` requires a `{field}` field")]
    MissingField {
        message_type: &'static str,
        field: &'static str,
    },
}
