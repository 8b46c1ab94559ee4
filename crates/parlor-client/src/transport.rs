//! Websocket transport for the realtime channel.
//!
//! Provides [`ConnectedSocket`], a pair of channels backed by a tokio task
//! that owns the websocket. This is a thin layer that only moves text frames;
//! protocol logic stays in the Sans-IO `parlor_core::Connection`.
//!
//! [`connect`] returns immediately. The handshake runs inside the task and its
//! outcome arrives as the first [`SocketEvent`]: `Opened` or `Failed`.

use futures::{SinkExt, StreamExt};
use parlor_proto::Frame;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        handshake::client::Request,
        http::{HeaderValue, header::COOKIE},
    },
};

use crate::config::session_cookie;

/// Capacity of the inbound and outbound channels.
const CHANNEL_CAPACITY: usize = 64;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The upgrade request could not be built.
    #[error("invalid socket request: {0}")]
    Request(String),
}

/// What happened on the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Handshake completed; frames may now be sent.
    Opened,
    /// A text frame arrived.
    Frame(Frame),
    /// The socket closed cleanly or the peer went away.
    Closed {
        /// Close reason
        reason: String,
    },
    /// The handshake or the socket failed.
    Failed {
        /// Error description
        reason: String,
    },
}

/// Handle to a websocket owned by a background task.
///
/// Dropping the handle stops the task, so a view can never leak its socket.
#[derive(Debug)]
pub struct ConnectedSocket {
    /// Send frames to the server.
    pub to_server: mpsc::Sender<Frame>,
    /// Receive socket events.
    pub from_server: mpsc::Receiver<SocketEvent>,
    /// Abort handle to stop the socket task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedSocket {
    /// Stop the socket task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for ConnectedSocket {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Open a websocket to `url`, authenticating with `session_token`.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// - `TransportError::Request` if `url` or the cookie is not a valid request
pub fn connect(url: &str, session_token: Option<&str>) -> Result<ConnectedSocket, TransportError> {
    let mut request =
        url.into_client_request().map_err(|e| TransportError::Request(e.to_string()))?;

    if let Some(token) = session_token {
        let cookie = HeaderValue::from_str(&session_cookie(token))
            .map_err(|e| TransportError::Request(e.to_string()))?;
        request.headers_mut().insert(COOKIE, cookie);
    }

    let (to_server_tx, to_server_rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);
    let (events_tx, events_rx) = mpsc::channel::<SocketEvent>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_socket(request, to_server_rx, events_tx));

    Ok(ConnectedSocket {
        to_server: to_server_tx,
        from_server: events_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the socket, bridging between the channels and the websocket.
async fn run_socket(
    request: Request,
    mut to_server: mpsc::Receiver<Frame>,
    events: mpsc::Sender<SocketEvent>,
) {
    let stream = match connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            let _ = events.send(SocketEvent::Failed { reason: e.to_string() }).await;
            return;
        },
    };

    if events.send(SocketEvent::Opened).await.is_err() {
        return;
    }

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outbound = to_server.recv() => {
                let Some(frame) = outbound else {
                    // Owner hung up.
                    let _ = write.close().await;
                    return;
                };

                if let Err(e) = write.send(Message::Text(frame.into_text().into())).await {
                    let _ = events.send(SocketEvent::Failed { reason: e.to_string() }).await;
                    return;
                }
            },
            inbound = read.next() => {
                let event = match inbound {
                    Some(Ok(Message::Text(text))) => SocketEvent::Frame(Frame::new(text.as_str())),
                    Some(Ok(Message::Close(close))) => {
                        let reason = close
                            .map(|c| c.reason.as_str().to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "closed by server".to_string());
                        let _ = events.send(SocketEvent::Closed { reason }).await;
                        return;
                    },
                    Some(Ok(Message::Binary(data))) => {
                        tracing::debug!(len = data.len(), "ignoring binary frame");
                        continue;
                    },
                    // Ping/pong are answered by tungstenite
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = events.send(SocketEvent::Failed { reason: e.to_string() }).await;
                        return;
                    },
                    None => {
                        let reason = "connection dropped".to_string();
                        let _ = events.send(SocketEvent::Closed { reason }).await;
                        return;
                    },
                };

                if events.send(event).await.is_err() {
                    return;
                }
            },
        }
    }
}
