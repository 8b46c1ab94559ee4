//! Protocol-to-Application translation layer.
//!
//! The [`Bridge`] owns the current view's [`parlor_core::Connection`] and
//! adapts it to the application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts connection-related [`crate::AppAction`]s (`Connect`, `Send`,
//!   `Disconnect`) into connection state machine calls.
//! - Accumulates [`TransportOp`]s (dial, frames, close) for the driver to
//!   execute in the next I/O cycle.
//! - Converts socket events and connection actions back into
//!   [`crate::AppEvent`]s tagged with the owning view.

use parlor_client::SocketEvent;
use parlor_core::{
    ChatError, Connection, ConnectionAction, ConnectionConfig, ConnectionError, ConnectionState,
};

use crate::{AppAction, AppEvent, SocketId, ViewId};

/// Transport work queued for the driver, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOp {
    /// Open a socket, known as the given id from now on.
    Dial(SocketId),
    /// Write a frame.
    Send(parlor_proto::Frame),
    /// Close the socket.
    Close {
        /// Reason for closing
        reason: String,
    },
}

/// Bridge between App and the connection state machine.
///
/// Holds at most one connection, owned by one view.
#[derive(Debug)]
pub struct Bridge {
    config: ConnectionConfig,
    /// View owning `connection`.
    owner: Option<ViewId>,
    connection: Option<Connection>,
    /// Socket dialed for `connection`. Events from any other are stale.
    socket: Option<SocketId>,
    last_socket: u64,
    ops: Vec<TransportOp>,
}

impl Bridge {
    /// Create a Bridge whose connections use `config`.
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config, owner: None, connection: None, socket: None, last_socket: 0, ops: Vec::new() }
    }

    /// Socket dialed for the current connection, if any.
    pub fn socket(&self) -> Option<SocketId> {
        self.socket
    }

    /// View owning the live connection, if any.
    pub fn owner(&self) -> Option<ViewId> {
        self.owner
    }

    /// State of the current connection. `Closed` when there is none.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.as_ref().map_or(ConnectionState::Closed, Connection::state)
    }

    /// Intents dropped by the current connection.
    pub fn dropped_sends(&self) -> u64 {
        self.connection.as_ref().map_or(0, Connection::dropped_sends)
    }

    /// Messages waiting for the current connection to open.
    pub fn queued_sends(&self) -> usize {
        self.connection.as_ref().map_or(0, Connection::queued_sends)
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        match action {
            AppAction::Connect { view, room_hash } => {
                self.release();

                let mut connection = Connection::new(room_hash, self.config.clone());
                let result = connection.open();
                self.owner = Some(view);
                self.connection = Some(connection);
                self.handle_result(view, result)
            },
            AppAction::Send { view, intent } => {
                let Some(connection) = self.owned_connection(view) else {
                    tracing::warn!(%view, kind = intent.kind(), "no connection for view, dropping intent");
                    return vec![];
                };
                let result = connection.send(&intent);
                self.handle_result(view, result)
            },
            AppAction::Disconnect { view } => {
                if self.owner == Some(view) {
                    self.release();
                }
                vec![]
            },
            AppAction::Render
            | AppAction::Quit
            | AppAction::ResolveRoom { .. }
            | AppAction::LoadHistory { .. }
            | AppAction::LookupPartner { .. } => vec![],
        }
    }

    /// Handle an event reported by `socket`.
    ///
    /// Only the socket dialed for the current connection is heard. Events a
    /// replaced socket reported before it was torn down are dropped.
    pub fn handle_socket_event(&mut self, socket: SocketId, event: SocketEvent) -> Vec<AppEvent> {
        if self.socket != Some(socket) {
            tracing::debug!(%socket, ?event, "event from stale socket, ignoring");
            return vec![];
        }
        let (Some(view), Some(connection)) = (self.owner, self.connection.as_mut()) else {
            tracing::debug!(?event, "socket event with no connection");
            return vec![];
        };

        match event {
            SocketEvent::Opened => {
                let result = connection.handle_opened();
                let mut events = self.handle_result(view, result);
                if self.connection_state() == ConnectionState::Open {
                    events.insert(0, AppEvent::Connected { view });
                }
                events
            },
            SocketEvent::Frame(frame) => match connection.handle_frame(&frame) {
                Ok(actions) => self.apply(view, actions),
                Err(e) => {
                    tracing::debug!(%view, error = %e, "dropping frame");
                    vec![]
                },
            },
            SocketEvent::Closed { reason } => {
                let actions = connection.handle_closed(&reason);
                let mut events = self.apply(view, actions);
                events.push(AppEvent::Disconnected { view, reason });
                events
            },
            SocketEvent::Failed { reason } => {
                let actions = connection.handle_failure(&reason);
                let mut events = self.apply(view, actions);
                events.push(AppEvent::ConnectionFailed { view, reason });
                events
            },
        }
    }

    /// Take pending transport work.
    pub fn take_ops(&mut self) -> Vec<TransportOp> {
        std::mem::take(&mut self.ops)
    }

    fn owned_connection(&mut self, view: ViewId) -> Option<&mut Connection> {
        if self.owner == Some(view) { self.connection.as_mut() } else { None }
    }

    /// Close and forget the current connection.
    fn release(&mut self) {
        if let (Some(view), Some(mut connection)) = (self.owner.take(), self.connection.take()) {
            let actions = connection.close();
            // Nothing can be delivered to a view that is going away.
            let _ = self.apply(view, actions);
        }
        self.socket = None;
    }

    fn handle_result(
        &mut self,
        view: ViewId,
        result: Result<Vec<ConnectionAction>, ConnectionError>,
    ) -> Vec<AppEvent> {
        match result {
            Ok(actions) => self.apply(view, actions),
            Err(e) => vec![AppEvent::Error { view, error: ChatError::Connection(e) }],
        }
    }

    fn apply(&mut self, view: ViewId, actions: Vec<ConnectionAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                ConnectionAction::Dial => {
                    self.last_socket += 1;
                    let socket = SocketId(self.last_socket);
                    self.socket = Some(socket);
                    self.ops.push(TransportOp::Dial(socket));
                },
                ConnectionAction::SendFrame(frame) => self.ops.push(TransportOp::Send(frame)),
                ConnectionAction::Close { reason } => self.ops.push(TransportOp::Close { reason }),
                ConnectionAction::Deliver(frame) => events.push(AppEvent::Inbound { view, frame }),
            }
        }

        events
    }
}
