//! Error types for the Parlor chat core.
//!
//! One enum per failure domain: the room directory (REST calls), room
//! resolution, and the realtime connection. [`ChatError`] is the umbrella a
//! chat view reports through; only resolution failures are fatal to a view.

use parlor_proto::ProtocolError;
use thiserror::Error;

use crate::connection::ConnectionState;

/// Failure of a single room directory call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Server answered with a non-2xx status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the response body, or the status reason
        message: String,
    },

    /// Request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Room could not be resolved, or its history could not be loaded.
///
/// Fatal to the chat view: it cannot proceed without a room.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Listing the caller's rooms failed.
    #[error("failed to list chat rooms: {0}")]
    List(#[source] DirectoryError),

    /// Creating the room failed.
    #[error("failed to create chat room: {0}")]
    Create(#[source] DirectoryError),

    /// Loading the room's message history failed.
    #[error("failed to load chat history: {0}")]
    History(#[source] DirectoryError),
}

/// Errors from the connection state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Operation is not valid in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Outbound frame could not be encoded
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<ProtocolError> for ConnectionError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}

/// Anything a chat view can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Room resolution or history load failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Socket failed to open or errored after opening
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Server sent an `error` frame
    #[error("server error: {message}")]
    Server {
        /// Message from the frame
        message: String,
    },
}

impl ChatError {
    /// Whether the view must stop. Only resolution failures are fatal;
    /// everything else leaves a working view behind.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }
}
