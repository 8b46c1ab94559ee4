//! Chat payload bodies shared by realtime frames and REST responses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable user identifier assigned by the forum backend.
pub type UserId = u64;

/// Opaque, server-issued chat room identifier.
///
/// Only ever constructed from server responses (room list, room create) or
/// test fixtures; the client never mints one on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomHash(String);

impl RoomHash {
    /// Wrap a server-issued hash.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Hash text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the server returned an empty hash.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public identity of a forum user.
///
/// History rows only carry the nickname, so the id is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id. `None` when the server omitted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Display nickname.
    #[serde(default)]
    pub nickname: String,
}

impl User {
    /// Create a user with a known id.
    pub fn new(id: UserId, nickname: impl Into<String>) -> Self {
        Self { id: Some(id), nickname: nickname.into() }
    }
}

/// A chat message, either from history or delivered live.
///
/// Immutable once received; views append these and never edit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Room the message belongs to. Live frames carry it, history rows do not.
    #[serde(rename = "roomHash", default, skip_serializing_if = "Option::is_none")]
    pub room_hash: Option<RoomHash>,
    /// Author of the message.
    pub sender: User,
    /// Message text.
    #[serde(rename = "message")]
    pub content: String,
    /// Server timestamp (RFC 3339).
    pub created_at: DateTime<Utc>,
}

/// Typing notification broadcast to a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingNotice {
    /// Room the notice belongs to.
    #[serde(rename = "roomHash", default, skip_serializing_if = "Option::is_none")]
    pub room_hash: Option<RoomHash>,
    /// User who is typing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<User>,
    /// Id of the user who is typing.
    #[serde(rename = "senderID", default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
}

impl TypingNotice {
    /// Best available label for the typist.
    pub fn display_name(&self) -> String {
        match (&self.sender, self.sender_id) {
            (Some(user), _) if !user.nickname.is_empty() => user.nickname.clone(),
            (_, Some(id)) => format!("user {id}"),
            _ => "someone".to_string(),
        }
    }
}

/// Server-reported error carried by an `error` frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,
}
