//! What the invariants get to look at.
//!
//! Only what a user or the server could observe: the rows on screen and the
//! frames on the wire.

use parlor_app::{App, ViewId, ViewStatus};
use parlor_proto::{Frame, RoomHash};

/// One entry in the driver's socket log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEntry {
    /// A socket was dialed.
    Dial,
    /// A frame was written to the open socket.
    Sent(Frame),
    /// The client closed the socket.
    Disconnect,
    /// The server or the network closed the socket.
    Dropped,
}

/// Snapshot of the system: the chat view plus everything sent on the wire.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Current view, if any.
    pub view: Option<ViewSnapshot>,
    /// Socket log since the driver was created.
    pub wire: Vec<WireEntry>,
}

impl SystemSnapshot {
    /// Create an empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture the App's view and a copy of the socket log.
    pub fn capture(app: &App, wire: &[WireEntry]) -> Self {
        let view = app.view().map(|view| ViewSnapshot {
            id: view.id,
            room_hash: view.room_hash().cloned(),
            status: view.status.clone(),
            message_count: view.messages().len(),
            placeholder_count: view.placeholder_count(),
        });

        Self { view, wire: wire.to_vec() }
    }
}

/// Snapshot of the chat view's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    /// View activation.
    pub id: ViewId,
    /// Resolved room, once known.
    pub room_hash: Option<RoomHash>,
    /// Lifecycle status.
    pub status: ViewStatus,
    /// Rendered message rows.
    pub message_count: usize,
    /// Rendered placeholder rows.
    pub placeholder_count: usize,
}
