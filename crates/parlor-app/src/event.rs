//! Application input events.
//!
//! This module defines [`AppEvent`], the inputs that drive the [`crate::App`]
//! state machine.
//!
//! Events originate from three sources:
//! - User input lines.
//! - Results of room directory calls made by the runtime.
//! - Connection notifications translated by the [`crate::Bridge`].

use parlor_core::{ChatError, ChatRoom, ResolutionError};
use parlor_proto::{ChatMessage, Inbound};

use crate::{UserInput, ViewId};

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A line of user input.
    Input(UserInput),

    /// Room resolved.
    RoomResolved {
        /// View that asked.
        view: ViewId,
        /// The room.
        room: ChatRoom,
    },

    /// Room resolution or history load failed.
    ResolutionFailed {
        /// View that asked.
        view: ViewId,
        /// What failed.
        error: ResolutionError,
    },

    /// History fetched, oldest first.
    HistoryLoaded {
        /// View that asked.
        view: ViewId,
        /// Messages in server order.
        messages: Vec<ChatMessage>,
    },

    /// Partner nickname found.
    PartnerNamed {
        /// View that asked.
        view: ViewId,
        /// Nickname.
        nickname: String,
    },

    /// Connection open, room joined.
    Connected {
        /// Owning view.
        view: ViewId,
    },

    /// Frame received from the server.
    Inbound {
        /// Owning view.
        view: ViewId,
        /// Decoded frame.
        frame: Inbound,
    },

    /// Connection closed by the server or the network.
    Disconnected {
        /// Owning view.
        view: ViewId,
        /// Close reason.
        reason: String,
    },

    /// Connection failed to open or errored after opening.
    ConnectionFailed {
        /// Owning view.
        view: ViewId,
        /// Error description.
        reason: String,
    },

    /// Any other error raised while serving a view.
    Error {
        /// Owning view.
        view: ViewId,
        /// The error.
        error: ChatError,
    },
}

impl AppEvent {
    /// View this event belongs to. `None` for user input, which always
    /// targets the current view.
    pub fn view(&self) -> Option<ViewId> {
        match self {
            Self::Input(_) => None,
            Self::RoomResolved { view, .. }
            | Self::ResolutionFailed { view, .. }
            | Self::HistoryLoaded { view, .. }
            | Self::PartnerNamed { view, .. }
            | Self::Connected { view }
            | Self::Inbound { view, .. }
            | Self::Disconnected { view, .. }
            | Self::ConnectionFailed { view, .. }
            | Self::Error { view, .. } => Some(*view),
        }
    }
}
