//! JSON-encoded realtime messages.
//!
//! Every frame on the wire is an object `{"type": <tag>, "payload": <body>}`.
//! Outbound frames are built from an [`Intent`]; inbound frames are parsed
//! into an [`Inbound`] by dispatching on the `type` tag.
//!
//! # Invariants
//!
//! - Unknown or missing `type` tags decode to [`Inbound::Unknown`]; they never
//!   produce an error.
//! - Decoding fails only for text that is not a JSON object, or for a known tag
//!   whose payload does not match its schema.

pub mod chat;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use self::chat::{ChatMessage, ErrorPayload, RoomHash, TypingNotice, User};
use crate::{
    Frame,
    errors::{ProtocolError, Result},
};

/// Outbound action a chat view asks the server to perform.
///
/// Ephemeral: intents are encoded, sent, and forgotten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Intent {
    /// Subscribe this connection to a room's broadcasts.
    #[serde(rename = "join_room")]
    JoinRoom {
        /// Room to join.
        #[serde(rename = "roomHash")]
        room_hash: RoomHash,
    },

    /// Post a message to a room.
    #[serde(rename = "message")]
    SendMessage {
        /// Message text.
        #[serde(rename = "message")]
        content: String,
        /// Target room.
        #[serde(rename = "roomHash")]
        room_hash: RoomHash,
    },

    /// Tell the room this user is typing.
    #[serde(rename = "typing")]
    Typing {
        /// Target room.
        #[serde(rename = "roomHash")]
        room_hash: RoomHash,
    },
}

impl Intent {
    /// Wire tag for this intent.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join_room",
            Self::SendMessage { .. } => "message",
            Self::Typing { .. } => "typing",
        }
    }

    /// Room this intent targets.
    pub fn room_hash(&self) -> &RoomHash {
        match self {
            Self::JoinRoom { room_hash }
            | Self::SendMessage { room_hash, .. }
            | Self::Typing { room_hash } => room_hash,
        }
    }

    /// Encode into a transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn to_frame(&self) -> Result<Frame> {
        serde_json::to_string(self)
            .map(Frame::new)
            .map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse an outbound frame (server side and test harnesses).
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the frame is not a valid intent
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        serde_json::from_str(frame.as_str()).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Frame received from the server, classified by its `type` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A chat message to append to the view.
    Message(ChatMessage),
    /// Users currently connected to the server.
    ActiveUsers(Vec<User>),
    /// Someone in the room is typing.
    Typing(TypingNotice),
    /// Server-side error report.
    Error(ErrorPayload),
    /// Any other frame. Logged and ignored by consumers.
    Unknown {
        /// The `type` tag, if the frame had a string one.
        kind: Option<String>,
        /// Original frame text.
        raw: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct ActiveUsersPayload {
    #[serde(default)]
    users: Option<Vec<User>>,
}

impl Inbound {
    /// Tag describing this frame, for logging.
    pub fn kind(&self) -> &str {
        match self {
            Self::Message(_) => "message",
            Self::ActiveUsers(_) => "active_users",
            Self::Typing(_) => "typing",
            Self::Error(_) => "error",
            Self::Unknown { kind, .. } => kind.as_deref().unwrap_or("<untyped>"),
        }
    }

    /// Parse a frame received from the server.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the text is not a JSON object
    /// - `ProtocolError::Payload` if a known frame type has a malformed payload
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let value: Value = serde_json::from_str(frame.as_str())
            .map_err(|e| ProtocolError::Decode(e.to_string()))?;

        let Value::Object(mut object) = value else {
            return Err(ProtocolError::Decode("frame is not a JSON object".to_string()));
        };

        let kind = match object.remove("type") {
            Some(Value::String(kind)) => Some(kind),
            _ => None,
        };
        let payload = object.remove("payload").unwrap_or(Value::Null);

        let inbound = match kind.as_deref() {
            Some("message") => Self::Message(
                serde_json::from_value(payload).map_err(|e| invalid_payload("message", &e))?,
            ),
            Some("active_users") => {
                let body: ActiveUsersPayload = lenient_payload("active_users", payload)?;
                Self::ActiveUsers(body.users.unwrap_or_default())
            },
            Some("typing") => Self::Typing(lenient_payload("typing", payload)?),
            Some("error") => Self::Error(lenient_payload("error", payload)?),
            _ => Self::Unknown { kind, raw: frame.as_str().to_string() },
        };

        Ok(inbound)
    }

    /// Encode as the server would (test servers and simulation).
    ///
    /// `Unknown` frames are reproduced verbatim.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn to_frame(&self) -> Result<Frame> {
        let (kind, payload) = match self {
            Self::Message(message) => ("message", to_value(message)?),
            Self::ActiveUsers(users) => {
                let mut body = Map::new();
                body.insert("users".to_string(), to_value(users)?);
                ("active_users", Value::Object(body))
            },
            Self::Typing(notice) => ("typing", to_value(notice)?),
            Self::Error(error) => ("error", to_value(error)?),
            Self::Unknown { raw, .. } => return Ok(Frame::new(raw.clone())),
        };

        let mut object = Map::new();
        object.insert("type".to_string(), Value::String(kind.to_string()));
        object.insert("payload".to_string(), payload);
        serde_json::to_string(&Value::Object(object))
            .map(Frame::new)
            .map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// Decode a payload whose fields are all optional; a missing payload yields
/// the default value.
fn lenient_payload<T: DeserializeOwned + Default>(kind: &'static str, payload: Value) -> Result<T> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload).map_err(|e| invalid_payload(kind, &e))
}

fn invalid_payload(kind: &'static str, err: &serde_json::Error) -> ProtocolError {
    ProtocolError::Payload { kind, reason: err.to_string() }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ProtocolError::Encode(e.to_string()))
}
