//! Chat view state machine.
//!
//! This module defines the [`App`] state machine, which manages the chat
//! screen completely decoupled from I/O and protocol mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Activation sequence
//!
//! ```text
//! activate ──> ResolveRoom ──RoomResolved──> LoadHistory ──HistoryLoaded──>
//!     Render, Connect ──Connected──> live
//! ```
//!
//! History is rendered before the connection is requested, so the join can
//! never race the history load. At most one view exists; activating a new one
//! disconnects the previous one first.

use parlor_core::{ChatError, Identity};
use parlor_proto::{Inbound, Intent, UserId};

use crate::{AppAction, AppEvent, ChatView, UserInput, ViewId, ViewStatus};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Local user, read-only.
    identity: Identity,
    /// Current view. `None` when no chat is open.
    view: Option<ChatView>,
    /// Last issued view id.
    last_view: u64,
    /// Application-level status line, shown when no view is open.
    status_message: Option<String>,
}

impl App {
    /// Create an App for the given local user.
    pub fn new(identity: Identity) -> Self {
        Self { identity, view: None, last_view: 0, status_message: None }
    }

    /// Local user.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Current view, if a chat is open.
    pub fn view(&self) -> Option<&ChatView> {
        self.view.as_ref()
    }

    /// Application status line.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Open the chat with `partner_id`.
    ///
    /// Nothing is carried over from a previous view; the room is resolved
    /// from scratch.
    pub fn activate(&mut self, partner_id: UserId) -> Vec<AppAction> {
        let mut actions = self.close_view();

        self.last_view += 1;
        let id = ViewId(self.last_view);
        self.view = Some(ChatView::new(id, partner_id));
        self.status_message = None;

        tracing::info!(view = %id, partner_id, "activating chat view");
        actions.extend([
            AppAction::ResolveRoom { view: id, self_id: self.identity.id, partner_id },
            AppAction::LookupPartner { view: id, partner_id },
            AppAction::Render,
        ]);
        actions
    }

    /// Close the current chat.
    pub fn deactivate(&mut self) -> Vec<AppAction> {
        let mut actions = self.close_view();
        if !actions.is_empty() {
            actions.push(AppAction::Render);
        }
        actions
    }

    /// Close everything and quit.
    pub fn quit(&mut self) -> Vec<AppAction> {
        let mut actions = self.close_view();
        actions.push(AppAction::Quit);
        actions
    }

    /// Replace the unsent input.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let Some(view) = self.view.as_mut() {
            view.draft = text.into();
        }
    }

    /// Submit the unsent input.
    pub fn submit_draft(&mut self) -> Vec<AppAction> {
        let draft = self.view.as_ref().map(|v| v.draft.clone()).unwrap_or_default();
        self.submit(&draft)
    }

    /// Send `content` to the current room.
    ///
    /// Blank content is ignored and leaves the draft untouched. So does a
    /// view with no room yet. Otherwise the draft is cleared right away,
    /// without waiting for delivery.
    pub fn submit(&mut self, content: &str) -> Vec<AppAction> {
        if content.trim().is_empty() {
            return vec![];
        }

        let Some(view) = self.view.as_mut() else {
            self.status_message = Some("No chat open".to_string());
            return vec![AppAction::Render];
        };

        let Some(room_hash) = view.room_hash().cloned().filter(|_| !view.is_failed()) else {
            tracing::warn!(view = %view.id, "submit before room is known, ignoring");
            return vec![];
        };

        view.draft.clear();
        let intent = Intent::SendMessage { content: content.to_string(), room_hash };
        vec![AppAction::Send { view: view.id, intent }, AppAction::Render]
    }

    /// Tell the room we are typing.
    pub fn typing(&mut self) -> Vec<AppAction> {
        match self.view.as_ref() {
            Some(view) if view.status == ViewStatus::Live => match view.room_hash() {
                Some(room_hash) => vec![AppAction::Send {
                    view: view.id,
                    intent: Intent::Typing { room_hash: room_hash.clone() },
                }],
                None => vec![],
            },
            _ => vec![],
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        if let AppEvent::Input(input) = event {
            return self.handle_input(input);
        }

        let Some(view) = self.view.as_mut().filter(|v| Some(v.id) == event.view()) else {
            tracing::debug!(event_view = ?event.view(), "discarding event for inactive view");
            return vec![];
        };

        match event {
            AppEvent::Input(_) => vec![],
            AppEvent::RoomResolved { room, .. } => {
                let room_hash = room.room_hash.clone();
                view.room = Some(room);
                view.status = ViewStatus::LoadingHistory;
                vec![AppAction::LoadHistory { view: view.id, room_hash }, AppAction::Render]
            },
            AppEvent::ResolutionFailed { error, .. } => {
                Self::fail(view, &ChatError::Resolution(error));
                vec![AppAction::Render]
            },
            AppEvent::HistoryLoaded { messages, .. } => {
                let Some(room_hash) = view.room_hash().cloned() else {
                    return vec![];
                };
                view.load_history(messages);
                view.status = ViewStatus::Connecting;
                vec![AppAction::Render, AppAction::Connect { view: view.id, room_hash }]
            },
            AppEvent::PartnerNamed { nickname, .. } => {
                view.partner_label = nickname;
                vec![AppAction::Render]
            },
            AppEvent::Connected { .. } => {
                view.status = ViewStatus::Live;
                view.notice = None;
                vec![AppAction::Render]
            },
            AppEvent::Inbound { frame, .. } => Self::apply_inbound(view, self.identity.id, frame),
            AppEvent::Disconnected { reason, .. } => {
                if !view.is_failed() {
                    view.status = ViewStatus::Offline { reason };
                }
                vec![AppAction::Render]
            },
            AppEvent::ConnectionFailed { reason, .. } => {
                view.notice = Some(format!("Connection failed: {reason}"));
                if !view.is_failed() {
                    view.status = ViewStatus::Offline { reason };
                }
                vec![AppAction::Render]
            },
            AppEvent::Error { error, .. } => {
                if error.is_fatal() {
                    Self::fail(view, &error);
                } else {
                    tracing::warn!(view = %view.id, %error, "chat view error");
                    view.notice = Some(error.to_string());
                }
                vec![AppAction::Render]
            },
        }
    }

    fn handle_input(&mut self, input: UserInput) -> Vec<AppAction> {
        match input {
            UserInput::Text(text) => {
                self.set_draft(text);
                self.submit_draft()
            },
            UserInput::Open(partner_id) => self.activate(partner_id),
            UserInput::Typing => self.typing(),
            UserInput::Close => self.deactivate(),
            UserInput::Quit => self.quit(),
            UserInput::Invalid(reason) => {
                match self.view.as_mut() {
                    Some(view) => view.notice = Some(reason),
                    None => self.status_message = Some(reason),
                }
                vec![AppAction::Render]
            },
        }
    }

    fn apply_inbound(view: &mut ChatView, self_id: UserId, frame: Inbound) -> Vec<AppAction> {
        match frame {
            Inbound::Message(message) => {
                if view.typing.as_deref() == Some(message.sender.nickname.as_str()) {
                    view.typing = None;
                }
                view.append(message);
                vec![AppAction::Render]
            },
            Inbound::ActiveUsers(users) => {
                view.active_users = users;
                vec![AppAction::Render]
            },
            Inbound::Typing(notice) => {
                let ours = notice.room_hash.as_ref().is_none_or(|h| Some(h) == view.room_hash());
                let from_self = notice.sender_id == Some(self_id)
                    || notice.sender.as_ref().and_then(|s| s.id) == Some(self_id);
                if !ours || from_self {
                    return vec![];
                }
                view.typing = Some(notice.display_name());
                vec![AppAction::Render]
            },
            Inbound::Error(error) => {
                let error = ChatError::Server { message: error.message };
                tracing::warn!(view = %view.id, %error, "server reported error");
                view.notice = Some(error.to_string());
                vec![AppAction::Render]
            },
            Inbound::Unknown { kind, .. } => {
                tracing::debug!(view = %view.id, ?kind, "ignoring unknown frame");
                vec![]
            },
        }
    }

    fn fail(view: &mut ChatView, error: &ChatError) {
        tracing::warn!(view = %view.id, %error, "chat view failed");
        view.status = ViewStatus::Failed { error: error.to_string() };
    }

    fn close_view(&mut self) -> Vec<AppAction> {
        match self.view.take() {
            Some(view) => {
                tracing::info!(view = %view.id, "closing chat view");
                vec![AppAction::Disconnect { view: view.id }]
            },
            None => vec![],
        }
    }
}
