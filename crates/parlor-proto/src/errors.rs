//! Protocol error types.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding frames.
///
/// Decoding errors are never fatal to a connection: the offending frame is
/// dropped and logged by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Intent could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Frame text is not a well-formed JSON object.
    #[error("malformed frame: {0}")]
    Decode(String),

    /// Frame type is known but its payload does not match the schema.
    #[error("invalid {kind} payload: {reason}")]
    Payload {
        /// Frame `type` tag that was being decoded
        kind: &'static str,
        /// Underlying deserializer message
        reason: String,
    },
}
