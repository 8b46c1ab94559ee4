//! Observable chat view state.
//!
//! [`ChatView`] is the view model of one activation of the chat screen. It
//! holds what a front end needs to draw the chat and nothing about sockets.

use std::fmt;

use parlor_core::ChatRoom;
use parlor_proto::{ChatMessage, RoomHash, User, UserId};

/// Identity of one view activation.
///
/// Every activation gets a fresh id. Results tagged with an older id belong to
/// a view that no longer exists and are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Where a view is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    /// Finding or creating the room.
    Resolving,
    /// Room known, fetching history.
    LoadingHistory,
    /// History rendered, socket opening.
    Connecting,
    /// Socket open and room joined.
    Live,
    /// Socket closed or failed. The view keeps its messages but receives
    /// nothing new until re-activated.
    Offline {
        /// Why the socket went away
        reason: String,
    },
    /// Room resolution or history load failed. The chat cannot open.
    Failed {
        /// Error text shown in place of the chat
        error: String,
    },
}

/// View model of the chat screen.
#[derive(Debug, Clone)]
pub struct ChatView {
    /// Activation this view belongs to.
    pub id: ViewId,
    /// User on the other side.
    pub partner_id: UserId,
    /// Label for the partner ("To: ..."). Nickname once known.
    pub partner_label: String,
    /// Resolved room, once known.
    pub room: Option<ChatRoom>,
    /// Lifecycle status.
    pub status: ViewStatus,
    /// Messages in arrival order.
    messages: Vec<ChatMessage>,
    /// History came back empty and nothing has arrived since.
    placeholder: bool,
    /// Users the server reports as connected.
    pub active_users: Vec<User>,
    /// Who is typing, if anyone.
    pub typing: Option<String>,
    /// Unsent input.
    pub draft: String,
    /// Transient notice (non-fatal errors, server errors).
    pub notice: Option<String>,
}

impl ChatView {
    /// Fresh view for a chat with `partner_id`.
    pub fn new(id: ViewId, partner_id: UserId) -> Self {
        Self {
            id,
            partner_id,
            partner_label: format!("user {partner_id}"),
            room: None,
            status: ViewStatus::Resolving,
            messages: Vec::new(),
            placeholder: false,
            active_users: Vec::new(),
            typing: None,
            draft: String::new(),
            notice: None,
        }
    }

    /// Room hash, once resolved.
    pub fn room_hash(&self) -> Option<&RoomHash> {
        self.room.as_ref().map(|r| &r.room_hash)
    }

    /// Messages, oldest first as delivered.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of placeholder rows to draw: 1 for an empty chat, else 0.
    pub fn placeholder_count(&self) -> usize {
        usize::from(self.placeholder)
    }

    /// Whether the view is still able to show a chat.
    pub fn is_failed(&self) -> bool {
        matches!(self.status, ViewStatus::Failed { .. })
    }

    /// Replace contents with fetched history, in server order.
    pub(crate) fn load_history(&mut self, messages: Vec<ChatMessage>) {
        self.placeholder = messages.is_empty() && self.messages.is_empty();
        self.messages = messages;
    }

    /// Append one live message at the tail.
    pub(crate) fn append(&mut self, message: ChatMessage) {
        self.placeholder = false;
        self.messages.push(message);
    }
}
