//! In-memory room directory.
//!
//! `SimDirectory` stands in for the forum's REST API. Clones share state, so
//! two runtimes (one per user) can resolve against the same rooms.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use parlor_core::{DirectoryError, RoomDirectory};
use parlor_proto::{ChatMessage, RoomHash, User, UserId, api::ChatInfo};

/// Directory call a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryCall {
    /// `GET /chats`
    ListRooms,
    /// `POST /chats`
    CreateRoom,
    /// `GET /chats/{hash}`
    History,
    /// `GET /users`
    ListUsers,
}

/// How often each directory call was made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `list_rooms` calls.
    pub list_rooms: usize,
    /// `create_room` calls.
    pub create_room: usize,
    /// `history` calls.
    pub history: usize,
    /// `list_users` calls.
    pub list_users: usize,
}

#[derive(Debug, Default)]
struct DirectoryState {
    rooms: Vec<ChatInfo>,
    history: HashMap<RoomHash, Vec<ChatMessage>>,
    users: Vec<User>,
    /// `(user1, user2)` of every create request, in order.
    create_requests: Vec<(UserId, UserId)>,
    next_hash: u64,
    calls: CallCounts,
    failures: HashMap<DirectoryCall, DirectoryError>,
}

/// In-memory [`RoomDirectory`] with deterministic hashes.
///
/// Created rooms are named `h1`, `h2`, ... in creation order.
#[derive(Debug, Clone, Default)]
pub struct SimDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl SimDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing room, stored as `(user1, user2)`.
    #[must_use]
    pub fn with_room(self, user1_id: UserId, user2_id: UserId, hash: &str) -> Self {
        self.lock().rooms.push(ChatInfo { user1_id, user2_id, chat_hash: RoomHash::new(hash) });
        self
    }

    /// Seed the history of a room.
    #[must_use]
    pub fn with_history(self, hash: &str, messages: Vec<ChatMessage>) -> Self {
        self.lock().history.insert(RoomHash::new(hash), messages);
        self
    }

    /// Seed a known user.
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        self.lock().users.push(user);
        self
    }

    /// Make every subsequent `call` fail with `error` until cleared.
    pub fn fail(&self, call: DirectoryCall, error: DirectoryError) {
        self.lock().failures.insert(call, error);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Call counters so far.
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Every create request as `(user1, user2)`, in order.
    pub fn create_requests(&self) -> Vec<(UserId, UserId)> {
        self.lock().create_requests.clone()
    }

    /// All rooms, seeded and created.
    pub fn rooms(&self) -> Vec<ChatInfo> {
        self.lock().rooms.clone()
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, call: DirectoryCall) -> Result<MutexGuard<'_, DirectoryState>, DirectoryError> {
        let mut state = self.lock();
        let calls = &mut state.calls;
        match call {
            DirectoryCall::ListRooms => calls.list_rooms += 1,
            DirectoryCall::CreateRoom => calls.create_room += 1,
            DirectoryCall::History => calls.history += 1,
            DirectoryCall::ListUsers => calls.list_users += 1,
        }

        if let Some(error) = state.failures.get(&call).cloned() {
            tracing::debug!(?call, %error, "injected directory failure");
            return Err(error);
        }
        Ok(state)
    }
}

#[async_trait]
impl RoomDirectory for SimDirectory {
    async fn list_rooms(&self) -> Result<Vec<ChatInfo>, DirectoryError> {
        Ok(self.enter(DirectoryCall::ListRooms)?.rooms.clone())
    }

    async fn create_room(&self, user1: UserId, user2: UserId) -> Result<RoomHash, DirectoryError> {
        let mut state = self.enter(DirectoryCall::CreateRoom)?;
        state.create_requests.push((user1, user2));
        state.next_hash += 1;

        let hash = RoomHash::new(format!("h{}", state.next_hash));
        state.rooms.push(ChatInfo { user1_id: user1, user2_id: user2, chat_hash: hash.clone() });
        Ok(hash)
    }

    async fn history(&self, room_hash: &RoomHash) -> Result<Vec<ChatMessage>, DirectoryError> {
        let state = self.enter(DirectoryCall::History)?;
        if !state.rooms.iter().any(|r| &r.chat_hash == room_hash) {
            return Err(DirectoryError::Status { status: 404, message: "chat not found".into() });
        }
        Ok(state.history.get(room_hash).cloned().unwrap_or_default())
    }

    async fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        Ok(self.enter(DirectoryCall::ListUsers)?.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_hashes_are_sequential() {
        let dir = SimDirectory::new();
        assert_eq!(dir.create_room(2, 1).await.unwrap().as_str(), "h1");
        assert_eq!(dir.create_room(3, 1).await.unwrap().as_str(), "h2");
        assert_eq!(dir.create_requests(), vec![(2, 1), (3, 1)]);
        assert_eq!(dir.rooms().len(), 2);
    }

    #[tokio::test]
    async fn clones_share_rooms() {
        let dir = SimDirectory::new();
        let other = dir.clone();
        dir.create_room(2, 1).await.unwrap();
        assert_eq!(other.list_rooms().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_is_counted_and_sticky() {
        let dir = SimDirectory::new();
        dir.fail(DirectoryCall::ListRooms, DirectoryError::Network("down".into()));

        assert!(dir.list_rooms().await.is_err());
        assert!(dir.list_rooms().await.is_err());
        assert_eq!(dir.calls().list_rooms, 2);

        dir.clear_failures();
        assert!(dir.list_rooms().await.is_ok());
    }

    #[tokio::test]
    async fn history_of_unknown_room_is_not_found() {
        let dir = SimDirectory::new();
        let err = dir.history(&RoomHash::new("nope")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Status { status: 404, .. }));
    }
}
