//! Fuzz target for the Connection state machine
//!
//! Ensure the join always leads and nothing is sent while not open.
//!
//! # Strategy
//!
//! - Random interleavings of open, opened, send, inbound frame, close,
//!   server close and failure
//! - Both send policies, with small queue capacities to hit overflow
//! - Inbound frames are arbitrary text
//!
//! # Invariants
//!
//! - The first frame sent after each `Dial` is `join_room` for the room
//! - No frame is sent unless the state is `Open` afterwards
//! - Every sent message was submitted, and in submission order
//! - Queued messages never exceed the configured capacity

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parlor_core::{Connection, ConnectionAction, ConnectionConfig, ConnectionState, SendPolicy};
use parlor_proto::{Frame, Intent, RoomHash};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Open,
    Opened,
    SendMessage(u8),
    SendTyping,
    Inbound(String),
    ServerClose,
    Failure,
    Close,
}

#[derive(Debug, Arbitrary)]
struct Input {
    drop_policy: bool,
    capacity: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let policy = if input.drop_policy {
        SendPolicy::Drop
    } else {
        SendPolicy::Queue { capacity: usize::from(input.capacity % 8) }
    };
    let room_hash = RoomHash::new("fuzz-room");
    let mut conn = Connection::new(room_hash.clone(), ConnectionConfig { send_policy: policy });

    let mut submitted: Vec<String> = Vec::new();
    let mut sent: Vec<String> = Vec::new();
    let mut awaiting_join = false;

    for op in input.ops {
        let before = conn.state();
        let actions = match op {
            Op::Open => conn.open().unwrap_or_default(),
            Op::Opened => conn.handle_opened().unwrap_or_default(),
            Op::SendMessage(n) => {
                let content = format!("m{}-{n}", submitted.len());
                submitted.push(content.clone());
                let intent = Intent::SendMessage { content, room_hash: room_hash.clone() };
                conn.send(&intent).unwrap_or_default()
            },
            Op::SendTyping => {
                conn.send(&Intent::Typing { room_hash: room_hash.clone() }).unwrap_or_default()
            },
            Op::Inbound(text) => conn.handle_frame(&Frame::new(text)).unwrap_or_default(),
            Op::ServerClose => conn.handle_closed("server close"),
            Op::Failure => conn.handle_failure("network"),
            Op::Close => conn.close(),
        };

        if let SendPolicy::Queue { capacity } = policy {
            assert!(conn.queued_sends() <= capacity, "queue exceeded capacity");
        }

        for action in actions {
            match action {
                ConnectionAction::Dial => {
                    assert!(matches!(before, ConnectionState::Closed | ConnectionState::Failed));
                    awaiting_join = true;
                },
                ConnectionAction::SendFrame(frame) => {
                    assert_eq!(conn.state(), ConnectionState::Open, "sent while not open");
                    let intent = Intent::from_frame(&frame).expect("own frames decode");
                    if awaiting_join {
                        assert_eq!(intent, Intent::JoinRoom { room_hash: room_hash.clone() });
                        awaiting_join = false;
                        continue;
                    }
                    match intent {
                        Intent::JoinRoom { .. } => panic!("join sent twice"),
                        Intent::SendMessage { content, .. } => sent.push(content),
                        Intent::Typing { .. } => {},
                    }
                },
                ConnectionAction::Deliver(_) => {
                    assert_eq!(conn.state(), ConnectionState::Open, "delivered while not open");
                },
                ConnectionAction::Close { .. } => {},
            }
        }
    }

    // Sent messages are a subsequence of submitted ones
    let mut remaining = submitted.iter();
    for content in &sent {
        assert!(remaining.any(|s| s == content), "message {content} sent out of order");
    }
});
