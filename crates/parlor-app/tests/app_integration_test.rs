//! Integration tests for App and Bridge behavior.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - App state reflects the expected view status
//! - Frames leave in protocol order (join first)
//! - Results for replaced views never leak into the current one

use chrono::{TimeZone, Utc};
use parlor_app::{App, AppAction, AppEvent, Bridge, TransportOp, ViewId, ViewStatus};
use parlor_client::SocketEvent;
use parlor_core::{ChatRoom, ConnectionConfig, ConnectionState, Identity};
use parlor_proto::{ChatMessage, Frame, Inbound, Intent, RoomHash, User};

/// Route App actions through the Bridge, feeding resulting events back to
/// the App. Directory actions are ignored; tests answer them by hand.
fn process_actions(app: &mut App, bridge: &mut Bridge, actions: Vec<AppAction>) -> Vec<TransportOp> {
    let mut pending = actions;

    while !pending.is_empty() {
        for action in std::mem::take(&mut pending) {
            match action {
                AppAction::Connect { .. } | AppAction::Send { .. } | AppAction::Disconnect { .. } => {
                    for event in bridge.process_app_action(action) {
                        pending.extend(app.handle(event));
                    }
                },
                AppAction::Render
                | AppAction::Quit
                | AppAction::ResolveRoom { .. }
                | AppAction::LoadHistory { .. }
                | AppAction::LookupPartner { .. } => {},
            }
        }
    }

    bridge.take_ops()
}

/// Simulate an event on the current socket.
fn socket_event(app: &mut App, bridge: &mut Bridge, event: SocketEvent) -> Vec<TransportOp> {
    let mut ops = Vec::new();
    let Some(socket) = bridge.socket() else {
        return Vec::new();
    };
    for app_event in bridge.handle_socket_event(socket, event) {
        let actions = app.handle(app_event);
        ops.extend(process_actions(app, bridge, actions));
    }
    ops.extend(bridge.take_ops());
    ops
}

/// Drive a fresh activation up to the point the socket is requested.
fn activate_until_dial(
    app: &mut App,
    bridge: &mut Bridge,
    partner: u64,
    hash: &str,
    history: Vec<ChatMessage>,
) -> (ViewId, Vec<TransportOp>) {
    let actions = app.activate(partner);
    let mut ops = process_actions(app, bridge, actions);

    let view = app.view().unwrap().id;
    let room = ChatRoom {
        room_hash: RoomHash::new(hash),
        user1_id: partner,
        user2_id: app.identity().id,
        created: false,
    };
    let actions = app.handle(AppEvent::RoomResolved { view, room });
    ops.extend(process_actions(app, bridge, actions));
    let actions = app.handle(AppEvent::HistoryLoaded { view, messages: history });
    ops.extend(process_actions(app, bridge, actions));
    (view, ops)
}

fn intents(ops: &[TransportOp]) -> Vec<Intent> {
    ops.iter()
        .filter_map(|op| match op {
            TransportOp::Send(frame) => Some(Intent::from_frame(frame).unwrap()),
            _ => None,
        })
        .collect()
}

fn message_frame(hash: &str, nickname: &str, text: &str) -> Frame {
    Inbound::Message(ChatMessage {
        room_hash: Some(RoomHash::new(hash)),
        sender: User::new(2, nickname),
        content: text.into(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    })
    .to_frame()
    .unwrap()
}

#[test]
fn full_activation_joins_then_receives() {
    let mut app = App::new(Identity::new(1, "alice"));
    let mut bridge = Bridge::new(ConnectionConfig::default());

    let (view, ops) = activate_until_dial(&mut app, &mut bridge, 2, "h1", vec![]);
    assert_eq!(ops, vec![TransportOp::Dial(bridge.socket().unwrap())]);
    assert_eq!(app.view().unwrap().status, ViewStatus::Connecting);

    let ops = socket_event(&mut app, &mut bridge, SocketEvent::Opened);
    assert_eq!(intents(&ops), vec![Intent::JoinRoom { room_hash: RoomHash::new("h1") }]);
    assert_eq!(app.view().unwrap().status, ViewStatus::Live);

    socket_event(&mut app, &mut bridge, SocketEvent::Frame(message_frame("h1", "bob", "hi")));

    // Oracle: one message from bob, placeholder gone
    let chat = app.view().unwrap();
    assert_eq!(chat.id, view);
    assert_eq!(chat.messages().len(), 1);
    assert_eq!(chat.messages()[0].sender.nickname, "bob");
    assert_eq!(chat.messages()[0].content, "hi");
    assert_eq!(chat.placeholder_count(), 0);
}

#[test]
fn message_typed_while_connecting_follows_join() {
    let mut app = App::new(Identity::new(1, "alice"));
    let mut bridge = Bridge::new(ConnectionConfig::default());
    activate_until_dial(&mut app, &mut bridge, 2, "h1", vec![]);

    let actions = app.submit("early bird");
    assert!(process_actions(&mut app, &mut bridge, actions).is_empty());
    assert_eq!(bridge.queued_sends(), 1);

    let ops = socket_event(&mut app, &mut bridge, SocketEvent::Opened);

    assert_eq!(intents(&ops), vec![
        Intent::JoinRoom { room_hash: RoomHash::new("h1") },
        Intent::SendMessage { content: "early bird".into(), room_hash: RoomHash::new("h1") },
    ]);
    // Own message is not shown until the server echoes it
    assert!(app.view().unwrap().messages().is_empty());
}

#[test]
fn own_message_appears_once_via_echo() {
    let mut app = App::new(Identity::new(1, "alice"));
    let mut bridge = Bridge::new(ConnectionConfig::default());
    activate_until_dial(&mut app, &mut bridge, 2, "h1", vec![]);
    socket_event(&mut app, &mut bridge, SocketEvent::Opened);

    let actions = app.submit("hello");
    let ops = process_actions(&mut app, &mut bridge, actions);
    assert_eq!(intents(&ops).len(), 1);
    assert_eq!(app.view().unwrap().draft, "");

    let echo = Inbound::Message(ChatMessage {
        room_hash: Some(RoomHash::new("h1")),
        sender: User::new(1, "alice"),
        content: "hello".into(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    });
    socket_event(&mut app, &mut bridge, SocketEvent::Frame(echo.to_frame().unwrap()));

    assert_eq!(app.view().unwrap().messages().len(), 1);
}

#[test]
fn reactivation_closes_old_socket_and_ignores_its_results() {
    let mut app = App::new(Identity::new(1, "alice"));
    let mut bridge = Bridge::new(ConnectionConfig::default());
    let (old, _) = activate_until_dial(&mut app, &mut bridge, 2, "h1", vec![]);
    socket_event(&mut app, &mut bridge, SocketEvent::Opened);

    let actions = app.activate(3);
    let ops = process_actions(&mut app, &mut bridge, actions);
    assert!(matches!(ops[..], [TransportOp::Close { .. }]));
    assert_eq!(bridge.connection_state(), ConnectionState::Closed);

    // A late history result for the old view is dropped
    let late = app.handle(AppEvent::HistoryLoaded { view: old, messages: vec![] });
    assert!(late.is_empty());

    let chat = app.view().unwrap();
    assert_ne!(chat.id, old);
    assert_eq!(chat.status, ViewStatus::Resolving);
    assert_eq!(chat.placeholder_count(), 0);
}

#[test]
fn connection_failure_leaves_view_offline_with_history() {
    let history = vec![ChatMessage {
        room_hash: None,
        sender: User { id: None, nickname: "bob".into() },
        content: "from yesterday".into(),
        created_at: Utc.with_ymd_and_hms(2024, 4, 30, 9, 0, 0).unwrap(),
    }];
    let mut app = App::new(Identity::new(1, "alice"));
    let mut bridge = Bridge::new(ConnectionConfig::default());
    activate_until_dial(&mut app, &mut bridge, 2, "h1", history);

    let ops = socket_event(&mut app, &mut bridge, SocketEvent::Failed {
        reason: "connection refused".into(),
    });

    assert!(matches!(ops[..], [TransportOp::Close { .. }]));
    let chat = app.view().unwrap();
    assert_eq!(chat.status, ViewStatus::Offline { reason: "connection refused".into() });
    assert_eq!(chat.messages().len(), 1);
    assert!(chat.notice.as_deref().unwrap().contains("connection refused"));
}

#[test]
fn unknown_and_malformed_frames_are_ignored() {
    let mut app = App::new(Identity::new(1, "alice"));
    let mut bridge = Bridge::new(ConnectionConfig::default());
    activate_until_dial(&mut app, &mut bridge, 2, "h1", vec![]);
    socket_event(&mut app, &mut bridge, SocketEvent::Opened);

    for text in [r#"{"type":"unknown_x","payload":{}}"#, "not json", r#"{"type":"message"}"#] {
        socket_event(&mut app, &mut bridge, SocketEvent::Frame(Frame::new(text)));
    }

    let chat = app.view().unwrap();
    assert_eq!(chat.status, ViewStatus::Live);
    assert!(chat.messages().is_empty());
    assert_eq!(chat.placeholder_count(), 1);
}

#[test]
fn quit_closes_the_socket() {
    let mut app = App::new(Identity::new(1, "alice"));
    let mut bridge = Bridge::new(ConnectionConfig::default());
    activate_until_dial(&mut app, &mut bridge, 2, "h1", vec![]);
    socket_event(&mut app, &mut bridge, SocketEvent::Opened);

    let actions = app.quit();
    assert_eq!(actions.last(), Some(&AppAction::Quit));
    let ops = process_actions(&mut app, &mut bridge, actions);

    assert!(matches!(ops[..], [TransportOp::Close { .. }]));
    assert!(app.view().is_none());
}
