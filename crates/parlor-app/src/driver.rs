//! The I/O seam of the chat client.
//!
//! Everything that touches a terminal or a socket sits behind [`Driver`]. The
//! terminal front end and the simulation harness each implement it, and both
//! run the same [`crate::Runtime`].

use std::future::Future;

use parlor_client::SocketEvent;
use parlor_proto::Frame;

use crate::{App, UserInput};

/// Identifies one dialed socket.
///
/// Handed out by the [`crate::Bridge`] with every dial. Drivers tag
/// everything a socket reports with its id, so events still in flight from
/// a socket that was already replaced can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SocketId(pub u64);

impl std::fmt::Display for SocketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}

/// Something the driver observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// A line of user input.
    Input(UserInput),
    /// Lifecycle event or frame from a realtime socket.
    Socket {
        /// Socket that reported it.
        socket: SocketId,
        /// What happened.
        event: SocketEvent,
    },
}

/// User input, one realtime socket, and a screen.
///
/// A driver owns at most one socket. Dialing while one is open replaces it.
/// Known drivers: `TerminalDriver` (stdin and a websocket) and `SimDriver`
/// (scripted events and a socket log).
pub trait Driver: Send {
    /// Failure of the driver itself, not of the chat.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next event.
    ///
    /// Returns `None` once no more events will ever arrive (input closed,
    /// script exhausted).
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<DriverEvent>, Self::Error>> + Send;

    /// Start opening the realtime socket known as `socket`.
    ///
    /// Completion is reported later as [`SocketEvent::Opened`] or
    /// [`SocketEvent::Failed`] from [`Driver::poll_event`], tagged with
    /// `socket` like every other event from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the dial cannot even be started.
    fn connect(&mut self, socket: SocketId) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a frame over the open socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket is closed or the send fails.
    fn send_frame(&mut self, frame: Frame) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the socket, if any. Idempotent.
    fn disconnect(&mut self);

    /// Whether a socket is open or opening.
    fn is_connected(&self) -> bool;

    /// Bring the screen up to date with `app`.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;
}
