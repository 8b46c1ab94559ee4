//! JSON bodies of the REST chat endpoints.
//!
//! Every REST response is wrapped in an [`Envelope`]; the typed body lives in
//! `payload`. Request bodies are sent bare.

use serde::{Deserialize, Serialize};

use crate::payloads::chat::{ChatMessage, RoomHash, User, UserId};

/// Standard response wrapper returned by every REST endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Short status text, e.g. `"OK"` or `"Not Found"`.
    #[serde(default)]
    pub status: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Typed body. Absent on most error responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T> Envelope<T> {
    /// Wrap a successful payload.
    pub fn ok(message: impl Into<String>, payload: T) -> Self {
        Self { status: "OK".to_string(), message: message.into(), payload: Some(payload) }
    }
}

/// One private chat room as listed by `GET /chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInfo {
    /// First participant.
    pub user1_id: UserId,
    /// Second participant.
    pub user2_id: UserId,
    /// Server-issued room hash. May be empty for half-created rows.
    #[serde(rename = "chatHash", default = "empty_hash")]
    pub chat_hash: RoomHash,
}

fn empty_hash() -> RoomHash {
    RoomHash::new("")
}

impl ChatInfo {
    /// Whether this room is between `a` and `b`, in either order.
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.user1_id == a && self.user2_id == b) || (self.user1_id == b && self.user2_id == a)
    }
}

/// Payload of `GET /chats`.
///
/// The server encodes an empty list as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatList {
    /// Rooms the caller participates in.
    #[serde(default)]
    pub chats: Option<Vec<ChatInfo>>,
}

impl ChatList {
    /// Rooms, treating `null` as empty.
    pub fn into_chats(self) -> Vec<ChatInfo> {
        self.chats.unwrap_or_default()
    }
}

/// Body of `POST /chats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChatRequest {
    /// First participant.
    pub user1_id: UserId,
    /// Second participant.
    pub user2_id: UserId,
}

/// Payload of `POST /chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChatResponse {
    /// Hash of the newly created room.
    #[serde(rename = "chatHash")]
    pub chat_hash: RoomHash,
}

/// Payload of `GET /chats/{hash}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    /// Messages in chronological order. `null` when the room is empty.
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
}

impl ChatHistory {
    /// Messages, treating `null` as empty.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages.unwrap_or_default()
    }
}

/// Payload of `GET /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserList {
    /// Known users.
    #[serde(default)]
    pub users: Option<Vec<User>>,
}

impl UserList {
    /// Users, treating `null` as empty.
    pub fn into_users(self) -> Vec<User> {
        self.users.unwrap_or_default()
    }
}
