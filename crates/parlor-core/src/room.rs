//! Room resolution.
//!
//! A private room is identified by the unordered pair of its participants:
//! `(a, b)` and `(b, a)` are the same room. The server assigns the room hash;
//! this module never mints one. [`resolve_room`] lists the caller's rooms once,
//! scans them in both orderings, and only creates a room when none matches.
//!
//! Concurrent first contact from both participants may still create two rooms
//! server-side. Nothing here tries to deduplicate them.

use async_trait::async_trait;
use parlor_proto::{
    ChatMessage, RoomHash, User, UserId,
    api::ChatInfo,
};

use crate::error::{DirectoryError, ResolutionError};

/// Read-only identity of the local user, as handed over by the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User id.
    pub id: UserId,
    /// Display nickname.
    pub nickname: String,
}

impl Identity {
    /// Create an identity.
    pub fn new(id: UserId, nickname: impl Into<String>) -> Self {
        Self { id, nickname: nickname.into() }
    }
}

/// REST collaborator that knows the caller's rooms.
///
/// Implemented over HTTP in production and in memory for simulation.
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// All rooms the caller participates in (`GET /chats`).
    async fn list_rooms(&self) -> Result<Vec<ChatInfo>, DirectoryError>;

    /// Create a room between `user1` and `user2`, returning its hash
    /// (`POST /chats`).
    async fn create_room(&self, user1: UserId, user2: UserId) -> Result<RoomHash, DirectoryError>;

    /// Message history of a room, oldest first (`GET /chats/{hash}`).
    async fn history(&self, room_hash: &RoomHash) -> Result<Vec<ChatMessage>, DirectoryError>;

    /// Known users (`GET /users`), used to label the chat partner.
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError>;
}

/// A resolved room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRoom {
    /// Server-issued room hash.
    pub room_hash: RoomHash,
    /// First participant as stored by the server.
    pub user1_id: UserId,
    /// Second participant as stored by the server.
    pub user2_id: UserId,
    /// Whether resolution had to create the room.
    pub created: bool,
}

impl ChatRoom {
    /// The other participant, from `self_id`'s point of view.
    pub fn partner_of(&self, self_id: UserId) -> UserId {
        if self.user1_id == self_id { self.user2_id } else { self.user1_id }
    }
}

/// Find the room shared by `a` and `b`, in either stored order.
///
/// Rows without a hash are not usable rooms and are skipped.
// Older clients stopped at the first row matching the pair, hash or not, and
// created a fresh room when that row had none. Here a hashless row only
// leads to creation if no later row for the pair carries a hash.
pub fn find_room(rooms: &[ChatInfo], a: UserId, b: UserId) -> Option<&ChatInfo> {
    rooms.iter().find(|room| !room.chat_hash.is_empty() && room.is_between(a, b))
}

/// Find or create the room shared by `self_id` and `partner_id`.
///
/// Idempotent once the room exists: a second call issues no create.
///
/// # Errors
///
/// - `ResolutionError::List` if the room list call fails
/// - `ResolutionError::Create` if the create call fails or returns no hash
pub async fn resolve_room<D>(
    directory: &D,
    self_id: UserId,
    partner_id: UserId,
) -> Result<ChatRoom, ResolutionError>
where
    D: RoomDirectory + ?Sized,
{
    let rooms = directory.list_rooms().await.map_err(ResolutionError::List)?;

    if let Some(room) = find_room(&rooms, self_id, partner_id) {
        tracing::debug!(room = %room.chat_hash, self_id, partner_id, "found existing room");
        return Ok(ChatRoom {
            room_hash: room.chat_hash.clone(),
            user1_id: room.user1_id,
            user2_id: room.user2_id,
            created: false,
        });
    }

    let room_hash =
        directory.create_room(partner_id, self_id).await.map_err(ResolutionError::Create)?;

    if room_hash.is_empty() {
        return Err(ResolutionError::Create(DirectoryError::InvalidResponse(
            "server returned an empty chat hash".to_string(),
        )));
    }

    tracing::info!(room = %room_hash, self_id, partner_id, "created room");
    Ok(ChatRoom { room_hash, user1_id: partner_id, user2_id: self_id, created: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(user1_id: UserId, user2_id: UserId, hash: &str) -> ChatInfo {
        ChatInfo { user1_id, user2_id, chat_hash: RoomHash::new(hash) }
    }

    #[test]
    fn find_room_matches_either_order() {
        let rooms = vec![info(3, 4, "other"), info(2, 1, "h1")];

        assert_eq!(find_room(&rooms, 1, 2).map(|r| r.chat_hash.as_str()), Some("h1"));
        assert_eq!(find_room(&rooms, 2, 1).map(|r| r.chat_hash.as_str()), Some("h1"));
        assert!(find_room(&rooms, 1, 3).is_none());
    }

    #[test]
    fn find_room_skips_rows_without_hash() {
        let rooms = vec![info(1, 2, ""), info(1, 2, "h2")];
        assert_eq!(find_room(&rooms, 1, 2).map(|r| r.chat_hash.as_str()), Some("h2"));

        let rooms = vec![info(1, 2, "")];
        assert!(find_room(&rooms, 1, 2).is_none());
    }

    #[test]
    fn find_room_allows_self_chat() {
        let rooms = vec![info(1, 2, "h1"), info(5, 5, "notes")];
        assert_eq!(find_room(&rooms, 5, 5).map(|r| r.chat_hash.as_str()), Some("notes"));
    }

    #[test]
    fn partner_of_returns_the_other_side() {
        let room = ChatRoom {
            room_hash: RoomHash::new("h1"),
            user1_id: 2,
            user2_id: 1,
            created: true,
        };
        assert_eq!(room.partner_of(1), 2);
        assert_eq!(room.partner_of(2), 1);
    }
}
