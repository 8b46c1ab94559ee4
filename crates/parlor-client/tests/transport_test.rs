//! Websocket transport against a loopback server
//!
//! A tokio-tungstenite server on 127.0.0.1 stands in for the forum backend.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use parlor_client::{SocketEvent, transport};
use parlor_proto::Frame;
use tokio::{net::TcpListener, sync::mpsc, time::timeout};
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
    },
};

/// Script played by the loopback server after accepting one client.
enum Script {
    /// Echo every text frame back, then wait for the client to go away.
    Echo,
    /// Send one frame, then close with this reason.
    SendThenClose(&'static str, &'static str),
}

async fn start_server(script: Script) -> (SocketAddr, Arc<Mutex<Option<String>>>, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let cookie = Arc::new(Mutex::new(None));
    let (seen_tx, seen_rx) = mpsc::channel(16);

    let captured = Arc::clone(&cookie);
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            *captured.lock().unwrap() = req
                .headers()
                .get("cookie")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            Ok(resp)
        };
        let mut ws = accept_hdr_async(tcp, callback).await.expect("handshake");

        match script {
            Script::Echo => {
                while let Some(Ok(msg)) = ws.next().await {
                    if let Message::Text(text) = msg {
                        let _ = seen_tx.send(text.as_str().to_string()).await;
                        ws.send(Message::Text(text)).await.expect("echo");
                    }
                }
            },
            Script::SendThenClose(frame, reason) => {
                ws.send(Message::Text(frame.into())).await.expect("send");
                ws.close(Some(tokio_tungstenite::tungstenite::protocol::CloseFrame {
                    code: tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode::Normal,
                    reason: reason.into(),
                }))
                .await
                .expect("close");
                while ws.next().await.is_some() {}
            },
        }
    });

    (addr, cookie, seen_rx)
}

async fn next_event(socket: &mut transport::ConnectedSocket) -> SocketEvent {
    timeout(Duration::from_secs(5), socket.from_server.recv())
        .await
        .expect("timed out waiting for socket event")
        .expect("event channel closed")
}

#[tokio::test]
async fn opens_then_relays_frames_both_ways() {
    let (addr, cookie, mut seen) = start_server(Script::Echo).await;
    let mut socket = transport::connect(&format!("ws://{addr}/api/ws"), Some("tok123")).unwrap();

    assert_eq!(next_event(&mut socket).await, SocketEvent::Opened);
    assert_eq!(cookie.lock().unwrap().as_deref(), Some("session_token=tok123"));

    let join = r#"{"type":"join_room","payload":{"roomHash":"h1"}}"#;
    socket.to_server.send(Frame::new(join)).await.unwrap();

    let received = timeout(Duration::from_secs(5), seen.recv()).await.unwrap().unwrap();
    assert_eq!(received, join);
    assert_eq!(next_event(&mut socket).await, SocketEvent::Frame(Frame::new(join)));

    socket.stop();
}

#[tokio::test]
async fn server_close_is_reported_with_reason() {
    let frame = r#"{"type":"active_users","payload":{"users":[]}}"#;
    let (addr, _cookie, _seen) = start_server(Script::SendThenClose(frame, "bye")).await;
    let mut socket = transport::connect(&format!("ws://{addr}/api/ws"), None).unwrap();

    assert_eq!(next_event(&mut socket).await, SocketEvent::Opened);
    assert_eq!(next_event(&mut socket).await, SocketEvent::Frame(Frame::new(frame)));
    assert_eq!(next_event(&mut socket).await, SocketEvent::Closed { reason: "bye".into() });
}

#[tokio::test]
async fn refused_connection_is_reported_as_failed() {
    // Bind and drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut socket = transport::connect(&format!("ws://{addr}/api/ws"), None).unwrap();

    assert!(matches!(next_event(&mut socket).await, SocketEvent::Failed { .. }));
}

#[tokio::test]
async fn invalid_url_is_rejected_up_front() {
    assert!(transport::connect("not a url", None).is_err());
}
