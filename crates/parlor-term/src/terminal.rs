//! Terminal driver.
//!
//! Implements the [`Driver`] trait over stdin lines and the websocket
//! transport from `parlor-client`. Rendering appends to stdout.

use std::io::{self, Stdout, Write};

use parlor_app::{App, Driver, DriverEvent, SocketId, UserInput};
use parlor_client::{
    SocketEvent,
    transport::{self, ConnectedSocket, TransportError},
};
use parlor_proto::Frame;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::Transcript;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No socket to send on.
    #[error("not connected")]
    NotConnected,

    /// Socket task is gone.
    #[error("socket closed")]
    ChannelSend,
}

enum Next {
    Socket(SocketId, Option<SocketEvent>),
    Line(io::Result<Option<String>>),
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver {
    input: Lines<BufReader<Stdin>>,
    out: Stdout,
    transcript: Transcript,
    socket: Option<(SocketId, ConnectedSocket)>,
    socket_url: String,
    session_token: Option<String>,
}

impl TerminalDriver {
    /// Create a driver that dials `socket_url` with the given session token.
    pub fn new(socket_url: String, session_token: Option<String>) -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()).lines(),
            out: io::stdout(),
            transcript: Transcript::new(),
            socket: None,
            socket_url,
            session_token,
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self) -> Result<Option<DriverEvent>, Self::Error> {
        loop {
            let next = {
                let socket = &mut self.socket;
                let input = &mut self.input;

                tokio::select! {
                    biased;

                    (id, event) = async {
                        match socket.as_mut() {
                            Some((id, socket)) => (*id, socket.from_server.recv().await),
                            None => std::future::pending().await,
                        }
                    } => Next::Socket(id, event),

                    line = input.next_line() => Next::Line(line),
                }
            };

            match next {
                Next::Socket(socket, Some(event)) => {
                    return Ok(Some(DriverEvent::Socket { socket, event }));
                },
                Next::Socket(socket, None) => {
                    tracing::debug!(%socket, "socket task ended");
                    self.socket = None;
                },
                Next::Line(line) => {
                    return Ok(line?.map(|line| DriverEvent::Input(UserInput::parse(&line))));
                },
            }
        }
    }

    async fn connect(&mut self, id: SocketId) -> Result<(), Self::Error> {
        // Replacing the handle aborts the previous socket task
        let socket = transport::connect(&self.socket_url, self.session_token.as_deref())?;
        self.socket = Some((id, socket));
        Ok(())
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let (_, socket) = self.socket.as_ref().ok_or(TerminalError::NotConnected)?;
        socket.to_server.send(frame).await.map_err(|_| TerminalError::ChannelSend)
    }

    fn disconnect(&mut self) {
        if let Some((_, socket)) = self.socket.take() {
            socket.stop();
        }
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let lines = self.transcript.update(app);
        if lines.is_empty() {
            return Ok(());
        }

        let mut out = self.out.lock();
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
