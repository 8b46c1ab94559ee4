//! Realtime connection state machine.
//!
//! Owns the lifecycle of the one socket a chat view uses. Uses the action
//! pattern: methods take inputs (user intents, transport notifications, raw
//! frames) and return [`ConnectionAction`]s for the driver to execute. No I/O
//! happens here.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐  open   ┌────────────┐  opened   ┌──────┐
//! │ Closed │────────>│ Connecting │──────────>│ Open │
//! └────────┘         └────────────┘           └──────┘
//!     ↑                   │                      │
//!     │                   │ failure              │ close / drop
//!     │                   ↓                      ↓
//!     │              ┌────────┐             ┌────────┐
//!     └──────────────│ Failed │             │ Closed │
//!         open       └────────┘             └────────┘
//! ```
//!
//! # Invariants
//!
//! - On entering `Open` the first action is always the `join_room` frame for
//!   this connection's room. Queued messages follow it, in submission order.
//! - Nothing is sent while not `Open`. Intents arriving early are queued or
//!   dropped according to [`SendPolicy`].
//! - There is no automatic reconnect. A dropped connection stays down until
//!   the owner calls [`Connection::open`] again.

use std::collections::VecDeque;

use parlor_proto::{Frame, Inbound, Intent, RoomHash};

use crate::error::ConnectionError;

/// Default bound on intents held while connecting.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Actions returned by the connection state machine.
///
/// The driver (simulation harness or websocket bridge) executes these:
/// - `Dial`: start opening the socket
/// - `SendFrame`: write the frame to the socket
/// - `Deliver`: hand a decoded frame to the chat view
/// - `Close`: tear the socket down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open the socket
    Dial,

    /// Send this frame to the server
    SendFrame(Frame),

    /// Deliver this decoded frame to the view
    Deliver(Inbound),

    /// Close the socket with this reason
    Close {
        /// Reason for closing the connection
        reason: String,
    },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket
    #[default]
    Closed,
    /// Socket handshake in progress
    Connecting,
    /// Socket live, room joined
    Open,
    /// Socket failed to open or errored after opening
    Failed,
}

/// What to do with intents submitted before the socket is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPolicy {
    /// Warn and discard.
    Drop,
    /// Hold up to `capacity` messages and flush them after the join.
    Queue {
        /// Maximum number of held messages. Overflow is dropped.
        capacity: usize,
    },
}

impl Default for SendPolicy {
    fn default() -> Self {
        Self::Queue { capacity: DEFAULT_QUEUE_CAPACITY }
    }
}

/// Connection configuration
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Handling of intents submitted while connecting
    pub send_policy: SendPolicy,
}

/// Connection state machine for one chat view.
///
/// Bound to a single room for its whole life. Pure state: no sockets, no
/// clocks.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Current state
    state: ConnectionState,
    /// Configuration
    config: ConnectionConfig,
    /// Room joined on open
    room_hash: RoomHash,
    /// Encoded messages waiting for `Open`
    pending: VecDeque<Frame>,
    /// Intents discarded so far
    dropped: u64,
}

impl Connection {
    /// Create a connection for `room_hash` in [`ConnectionState::Closed`].
    pub fn new(room_hash: RoomHash, config: ConnectionConfig) -> Self {
        Self { state: ConnectionState::Closed, config, room_hash, pending: VecDeque::new(), dropped: 0 }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Room this connection joins.
    pub fn room_hash(&self) -> &RoomHash {
        &self.room_hash
    }

    /// Active send policy.
    pub fn send_policy(&self) -> SendPolicy {
        self.config.send_policy
    }

    /// Number of intents discarded since creation.
    pub fn dropped_sends(&self) -> u64 {
        self.dropped
    }

    /// Number of messages currently waiting for the socket to open.
    pub fn queued_sends(&self) -> usize {
        self.pending.len()
    }

    /// Start opening the socket.
    ///
    /// Transitions to `Connecting` and returns `Dial`.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless `Closed` or `Failed`
    pub fn open(&mut self) -> Result<Vec<ConnectionAction>, ConnectionError> {
        match self.state {
            ConnectionState::Closed | ConnectionState::Failed => {
                self.state = ConnectionState::Connecting;
                tracing::debug!(room = %self.room_hash, "dialing");
                Ok(vec![ConnectionAction::Dial])
            },
            state => Err(ConnectionError::InvalidState { state, operation: "open" }),
        }
    }

    /// The transport finished its handshake.
    ///
    /// Transitions to `Open`, sends the join, then flushes queued messages.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless `Connecting`
    /// - `ConnectionError::Protocol` if the join cannot be encoded
    pub fn handle_opened(&mut self) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState { state: self.state, operation: "handle_opened" });
        }

        let join = Intent::JoinRoom { room_hash: self.room_hash.clone() }.to_frame()?;
        self.state = ConnectionState::Open;

        let mut actions = Vec::with_capacity(1 + self.pending.len());
        actions.push(ConnectionAction::SendFrame(join));
        actions.extend(self.pending.drain(..).map(ConnectionAction::SendFrame));

        tracing::info!(room = %self.room_hash, flushed = actions.len() - 1, "connection open");
        Ok(actions)
    }

    /// Submit an outbound intent.
    ///
    /// Sent immediately while `Open`. While `Connecting`, messages follow the
    /// [`SendPolicy`]; other intents are dropped. While `Closed` or `Failed`,
    /// everything is dropped.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::Protocol` if the intent cannot be encoded
    pub fn send(&mut self, intent: &Intent) -> Result<Vec<ConnectionAction>, ConnectionError> {
        match self.state {
            ConnectionState::Open => Ok(vec![ConnectionAction::SendFrame(intent.to_frame()?)]),
            ConnectionState::Connecting => {
                let capacity = match (self.config.send_policy, intent) {
                    (SendPolicy::Queue { capacity }, Intent::SendMessage { .. }) => capacity,
                    _ => {
                        self.drop_intent(intent, "connection not open yet");
                        return Ok(vec![]);
                    },
                };

                if self.pending.len() >= capacity {
                    self.drop_intent(intent, "send queue full");
                    return Ok(vec![]);
                }

                self.pending.push_back(intent.to_frame()?);
                tracing::debug!(queued = self.pending.len(), "queued message until open");
                Ok(vec![])
            },
            ConnectionState::Closed | ConnectionState::Failed => {
                self.drop_intent(intent, "connection closed");
                Ok(vec![])
            },
        }
    }

    /// Process a frame received from the server.
    ///
    /// Malformed frames are logged and dropped; they never close the
    /// connection.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless `Open`
    pub fn handle_frame(&mut self, frame: &Frame) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Open {
            return Err(ConnectionError::InvalidState { state: self.state, operation: "handle_frame" });
        }

        match Inbound::from_frame(frame) {
            Ok(inbound) => {
                if let Inbound::Unknown { kind, .. } = &inbound {
                    tracing::debug!(kind = kind.as_deref().unwrap_or("<none>"), "unknown frame type");
                }
                Ok(vec![ConnectionAction::Deliver(inbound)])
            },
            Err(e) => {
                tracing::warn!(error = %e, len = frame.len(), "dropping malformed frame");
                Ok(vec![])
            },
        }
    }

    /// The transport closed (server close or network drop).
    ///
    /// Transitions to `Closed` and discards queued messages. No reconnect.
    pub fn handle_closed(&mut self, reason: &str) -> Vec<ConnectionAction> {
        if matches!(self.state, ConnectionState::Closed | ConnectionState::Failed) {
            return vec![];
        }

        tracing::info!(room = %self.room_hash, %reason, "connection closed");
        self.state = ConnectionState::Closed;
        self.discard_pending();
        vec![]
    }

    /// The transport failed to open or errored after opening.
    ///
    /// Transitions to `Failed` and asks the driver to release the socket.
    pub fn handle_failure(&mut self, reason: &str) -> Vec<ConnectionAction> {
        if matches!(self.state, ConnectionState::Closed | ConnectionState::Failed) {
            return vec![];
        }

        tracing::warn!(room = %self.room_hash, %reason, "connection failed");
        self.state = ConnectionState::Failed;
        self.discard_pending();
        vec![ConnectionAction::Close { reason: reason.to_string() }]
    }

    /// Close the connection from our side.
    pub fn close(&mut self) -> Vec<ConnectionAction> {
        if matches!(self.state, ConnectionState::Closed | ConnectionState::Failed) {
            self.state = ConnectionState::Closed;
            return vec![];
        }

        self.state = ConnectionState::Closed;
        self.discard_pending();
        vec![ConnectionAction::Close { reason: "view closed".to_string() }]
    }

    fn drop_intent(&mut self, intent: &Intent, why: &'static str) {
        self.dropped += 1;
        tracing::warn!(kind = intent.kind(), state = ?self.state, why, "dropping outbound intent");
    }

    fn discard_pending(&mut self) {
        if !self.pending.is_empty() {
            self.dropped += self.pending.len() as u64;
            tracing::warn!(discarded = self.pending.len(), "discarding queued messages");
            self.pending.clear();
        }
    }
}
