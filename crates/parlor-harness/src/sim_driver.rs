//! Scripted [`Driver`] for tests.
//!
//! Stands in for the terminal and the websocket under the real
//! [`parlor_app::Runtime`]. Input lines and socket events are queued up
//! front or injected between runtime steps. Every socket operation lands in
//! a [`WireEntry`] log that tests and invariants inspect afterwards.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use parlor_app::{App, Driver, DriverEvent, SocketId, UserInput};
use parlor_client::SocketEvent;
use parlor_proto::{ChatMessage, Frame, Inbound, Intent, User};

use crate::invariants::{InvariantRegistry, SystemSnapshot, WireEntry};

/// A refused dial, or a send with no socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimDriverError(pub String);

impl fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simulated socket: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Behind a mutex so tests can inject while the runtime owns the driver.
#[derive(Debug, Default)]
struct SharedState {
    pending_events: VecDeque<DriverEvent>,
    wire: Vec<WireEntry>,
    connected: bool,
    /// Last socket dialed; injected socket events are tagged with it.
    socket: SocketId,
    connects: usize,
    renders: usize,
    refuse_connect: Option<String>,
}

/// Deterministic driver.
///
/// With auto-open (the default) every successful dial queues
/// [`SocketEvent::Opened`] at the back of the event queue. With echo enabled
/// every sent message comes back as an inbound `message` frame, as the real
/// server broadcasts to the whole room including the sender.
#[derive(Debug)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    auto_open: bool,
    echo_as: Option<User>,
    invariants: Option<InvariantRegistry>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Create a new simulation driver with auto-open and no echo.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState::default())),
            auto_open: true,
            echo_as: None,
            invariants: None,
        }
    }

    /// Leave socket opening to the test, via [`SimDriver::inject_socket`].
    #[must_use]
    pub fn manual_open(mut self) -> Self {
        self.auto_open = false;
        self
    }

    /// Echo sent messages back, authored by `user`.
    #[must_use]
    pub fn with_echo(mut self, user: User) -> Self {
        self.echo_as = Some(user);
        self
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Queue a line of user input.
    pub fn inject_line(&self, line: &str) {
        self.inject_input(UserInput::parse(line));
    }

    /// Queue classified user input.
    pub fn inject_input(&self, input: UserInput) {
        self.lock().pending_events.push_back(DriverEvent::Input(input));
    }

    /// Queue an event on the last dialed socket. `Closed` and `Failed`
    /// drop the socket when they are delivered, unless it was replaced in
    /// the meantime.
    pub fn inject_socket(&self, event: SocketEvent) {
        let mut state = self.lock();
        let socket = state.socket;
        state.pending_events.push_back(DriverEvent::Socket { socket, event });
    }

    /// Queue an inbound frame.
    pub fn inject_frame(&self, frame: Frame) {
        self.inject_socket(SocketEvent::Frame(frame));
    }

    /// Refuse every subsequent dial with `reason`, or accept again with `None`.
    pub fn refuse_connect(&self, reason: Option<&str>) {
        self.lock().refuse_connect = reason.map(str::to_string);
    }

    /// Whether injected events are still waiting to be polled.
    pub fn has_pending(&self) -> bool {
        !self.lock().pending_events.is_empty()
    }

    /// Copy of the socket log.
    pub fn wire(&self) -> Vec<WireEntry> {
        self.lock().wire.clone()
    }

    /// Intents written to sockets, in order, across all sockets.
    pub fn sent_intents(&self) -> Vec<Intent> {
        self.lock()
            .wire
            .iter()
            .filter_map(|entry| match entry {
                WireEntry::Sent(frame) => Intent::from_frame(frame).ok(),
                _ => None,
            })
            .collect()
    }

    /// Number of dials attempted.
    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    /// Number of renders.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }

    /// Run the installed invariants, if any, against `app` and the socket
    /// log. Panics on violation.
    pub fn check_invariants(&self, app: &App, context: &str) {
        if let Some(registry) = &self.invariants {
            let snapshot = SystemSnapshot::capture(app, &self.lock().wire);
            registry.assert_all(&snapshot, context);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn echo_of(&self, intent: &Intent) -> Option<Frame> {
        let (Some(user), Intent::SendMessage { content, room_hash }) = (&self.echo_as, intent) else {
            return None;
        };

        let message = ChatMessage {
            room_hash: Some(room_hash.clone()),
            sender: user.clone(),
            content: content.clone(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        Inbound::Message(message).to_frame().ok()
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<DriverEvent>, Self::Error> {
        let mut state = self.lock();
        let event = state.pending_events.pop_front();

        if let Some(DriverEvent::Socket {
            socket,
            event: SocketEvent::Closed { .. } | SocketEvent::Failed { .. },
        }) = &event
            && *socket == state.socket
            && state.connected
        {
            state.connected = false;
            state.wire.push(WireEntry::Dropped);
        }
        Ok(event)
    }

    async fn connect(&mut self, socket: SocketId) -> Result<(), Self::Error> {
        let mut state = self.lock();
        state.connects += 1;
        state.socket = socket;
        state.wire.push(WireEntry::Dial);
        state.connected = true;

        if let Some(reason) = state.refuse_connect.clone() {
            return Err(SimDriverError(reason));
        }

        if self.auto_open {
            state.pending_events.push_back(DriverEvent::Socket { socket, event: SocketEvent::Opened });
        }
        Ok(())
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let echo = Intent::from_frame(&frame).ok().and_then(|intent| self.echo_of(&intent));

        let mut state = self.lock();
        if !state.connected {
            return Err(SimDriverError("socket not connected".into()));
        }
        state.wire.push(WireEntry::Sent(frame));

        if let Some(echo) = echo {
            let socket = state.socket;
            state.pending_events.push_back(DriverEvent::Socket { socket, event: SocketEvent::Frame(echo) });
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut state = self.lock();
        if state.connected {
            state.connected = false;
            state.wire.push(WireEntry::Disconnect);
        }
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.lock().renders += 1;
        self.check_invariants(app, "after render");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parlor_proto::RoomHash;

    use super::*;

    #[test]
    fn inject_line_queues_input() {
        let driver = SimDriver::new();
        driver.inject_line("/open 2");

        assert!(driver.has_pending());
    }

    #[tokio::test]
    async fn connect_auto_opens() {
        let mut driver = SimDriver::new();
        driver.connect(SocketId(1)).await.unwrap();

        assert!(driver.is_connected());
        assert_eq!(
            driver.poll_event().await.unwrap(),
            Some(DriverEvent::Socket { socket: SocketId(1), event: SocketEvent::Opened })
        );
        assert_eq!(driver.poll_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn refused_dial_still_counts_and_must_be_released() {
        let mut driver = SimDriver::new();
        driver.refuse_connect(Some("refused"));

        assert!(driver.connect(SocketId(1)).await.is_err());
        assert_eq!(driver.connects(), 1);
        assert!(!driver.has_pending());

        driver.disconnect();
        assert_eq!(driver.wire(), vec![WireEntry::Dial, WireEntry::Disconnect]);
    }

    #[tokio::test]
    async fn echo_returns_messages_only() {
        let mut driver = SimDriver::new().manual_open().with_echo(User::new(1, "alice"));
        driver.connect(SocketId(1)).await.unwrap();

        let join = Intent::JoinRoom { room_hash: RoomHash::new("h1") };
        driver.send_frame(join.to_frame().unwrap()).await.unwrap();
        assert!(!driver.has_pending());

        let send = Intent::SendMessage { content: "hey".into(), room_hash: RoomHash::new("h1") };
        driver.send_frame(send.to_frame().unwrap()).await.unwrap();

        let Some(DriverEvent::Socket { event: SocketEvent::Frame(frame), .. }) =
            driver.poll_event().await.unwrap()
        else {
            panic!("expected echo frame");
        };
        let Inbound::Message(message) = Inbound::from_frame(&frame).unwrap() else {
            panic!("expected message");
        };
        assert_eq!(message.content, "hey");
        assert_eq!(message.sender.nickname, "alice");
    }

    #[tokio::test]
    async fn send_without_socket_fails() {
        let mut driver = SimDriver::new();
        assert!(driver.send_frame(Frame::new("{}")).await.is_err());
    }

    #[tokio::test]
    async fn server_close_drops_socket_on_delivery() {
        let mut driver = SimDriver::new().manual_open();
        driver.connect(SocketId(1)).await.unwrap();

        driver.inject_socket(SocketEvent::Closed { reason: "bye".into() });
        assert!(driver.is_connected());

        driver.poll_event().await.unwrap();
        assert!(!driver.is_connected());
        assert_eq!(driver.wire(), vec![WireEntry::Dial, WireEntry::Dropped]);
    }

    #[tokio::test]
    async fn close_from_a_replaced_socket_keeps_the_new_one() {
        let mut driver = SimDriver::new().manual_open();
        driver.connect(SocketId(1)).await.unwrap();
        driver.inject_socket(SocketEvent::Closed { reason: "bye".into() });
        driver.disconnect();
        driver.connect(SocketId(2)).await.unwrap();

        let event = driver.poll_event().await.unwrap();

        assert!(matches!(event, Some(DriverEvent::Socket { socket: SocketId(1), .. })));
        assert!(driver.is_connected());
        assert_eq!(driver.wire(), vec![WireEntry::Dial, WireEntry::Disconnect, WireEntry::Dial]);
    }
}
