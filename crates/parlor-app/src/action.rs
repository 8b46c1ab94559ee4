//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.
//! Every I/O-bound action names the view it was issued for, and the resulting
//! events carry that id back.

use parlor_proto::{Intent, RoomHash, UserId};

use crate::ViewId;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Find or create the room between two users.
    ResolveRoom {
        /// Requesting view.
        view: ViewId,
        /// Local user.
        self_id: UserId,
        /// Chat partner.
        partner_id: UserId,
    },

    /// Fetch a room's message history.
    LoadHistory {
        /// Requesting view.
        view: ViewId,
        /// Room to fetch.
        room_hash: RoomHash,
    },

    /// Look up the partner's nickname for the view header.
    LookupPartner {
        /// Requesting view.
        view: ViewId,
        /// Chat partner.
        partner_id: UserId,
    },

    /// Open the realtime connection and join the room.
    Connect {
        /// Owning view.
        view: ViewId,
        /// Room to join once open.
        room_hash: RoomHash,
    },

    /// Send an intent over the view's connection.
    Send {
        /// Owning view.
        view: ViewId,
        /// What to send.
        intent: Intent,
    },

    /// Close the view's connection.
    Disconnect {
        /// Owning view.
        view: ViewId,
    },
}
