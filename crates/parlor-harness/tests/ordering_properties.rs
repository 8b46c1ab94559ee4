//! Property-based tests for outbound ordering and view invariants.
//!
//! Tests verify that invariants hold for every interleaving of user input
//! with socket lifecycle events, through the production Runtime.

use parlor_app::Runtime;
use parlor_client::SocketEvent;
use parlor_core::{ConnectionConfig, Identity, SendPolicy};
use parlor_harness::{InvariantRegistry, SimDirectory, SimDriver, SystemSnapshot};
use parlor_proto::{Frame, Intent, RoomHash, User};
use proptest::prelude::*;

type SimRuntime = Runtime<SimDriver, SimDirectory>;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
}

async fn drain(rt: &mut SimRuntime) {
    while rt.driver().has_pending() {
        if rt.pump().await.unwrap() {
            break;
        }
    }
}

/// Runtime with an activated view whose socket is dialed but not yet open.
async fn connecting(policy: SendPolicy, echo: bool) -> SimRuntime {
    let directory = SimDirectory::new().with_room(2, 1, "h1").with_room(1, 3, "h2");
    let mut driver = SimDriver::new().manual_open().with_invariants(InvariantRegistry::standard());
    if echo {
        driver = driver.with_echo(User::new(1, "alice"));
    }

    let mut rt = Runtime::new(
        driver,
        directory,
        Identity::new(1, "alice"),
        ConnectionConfig { send_policy: policy },
    );
    rt.activate(2).await.unwrap();
    rt
}

fn message_texts(intents: &[Intent]) -> Vec<String> {
    intents
        .iter()
        .filter_map(|intent| match intent {
            Intent::SendMessage { content, .. } => Some(content.clone()),
            _ => None,
        })
        .collect()
}

/// Random driver events after activation.
#[derive(Debug, Clone)]
enum Step {
    Line(String),
    Typing,
    Reopen(u64),
    Close,
    Opened,
    ServerClose,
    Failure,
    Unknown,
    Garbage,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => "[a-z ]{0,8}".prop_map(Step::Line),
        1 => Just(Step::Typing),
        1 => prop::sample::select(vec![2u64, 3]).prop_map(Step::Reopen),
        1 => Just(Step::Close),
        3 => Just(Step::Opened),
        1 => Just(Step::ServerClose),
        1 => Just(Step::Failure),
        1 => Just(Step::Unknown),
        1 => Just(Step::Garbage),
    ]
}

fn inject(driver: &SimDriver, step: &Step) {
    match step {
        Step::Line(text) => driver.inject_line(text),
        Step::Typing => driver.inject_line("/typing"),
        Step::Reopen(partner) => driver.inject_line(&format!("/open {partner}")),
        Step::Close => driver.inject_line("/close"),
        Step::Opened => driver.inject_socket(SocketEvent::Opened),
        Step::ServerClose => driver.inject_socket(SocketEvent::Closed { reason: "bye".into() }),
        Step::Failure => driver.inject_socket(SocketEvent::Failed { reason: "reset".into() }),
        Step::Unknown => driver.inject_frame(Frame::new(r#"{"type":"unknown_x"}"#)),
        Step::Garbage => driver.inject_frame(Frame::new("{not json")),
    }
}

proptest! {
    /// Join precedes every message, whenever the socket opens relative to
    /// typing, and queued messages keep submission order.
    #[test]
    fn join_first_for_any_open_timing(
        before in prop::collection::vec("[a-z]{1,6}", 0..6),
        after in prop::collection::vec("[a-z]{1,6}", 0..6),
    ) {
        let sent = block_on(async {
            let mut rt = connecting(SendPolicy::default(), false).await;
            for text in &before {
                rt.driver().inject_line(text);
            }
            rt.driver().inject_socket(SocketEvent::Opened);
            for text in &after {
                rt.driver().inject_line(text);
            }
            drain(&mut rt).await;
            rt.driver().sent_intents()
        });

        prop_assert_eq!(&sent[0], &Intent::JoinRoom { room_hash: RoomHash::new("h1") });
        let expected: Vec<String> = before.iter().chain(&after).cloned().collect();
        prop_assert_eq!(message_texts(&sent), expected);
    }

    /// Under the drop policy, messages typed before open are lost and
    /// counted; later ones still follow the join.
    #[test]
    fn drop_policy_counts_early_messages(
        before in prop::collection::vec("[a-z]{1,6}", 0..6),
        after in prop::collection::vec("[a-z]{1,6}", 0..6),
    ) {
        let (sent, dropped) = block_on(async {
            let mut rt = connecting(SendPolicy::Drop, false).await;
            for text in &before {
                rt.driver().inject_line(text);
            }
            rt.driver().inject_socket(SocketEvent::Opened);
            for text in &after {
                rt.driver().inject_line(text);
            }
            drain(&mut rt).await;
            (rt.driver().sent_intents(), rt.bridge().dropped_sends())
        });

        prop_assert_eq!(message_texts(&sent), after.clone());
        prop_assert_eq!(dropped, before.len() as u64);
    }

    /// Every message sent shows up exactly once, through the echo.
    #[test]
    fn echoed_messages_appear_once(texts in prop::collection::vec("[a-z]{1,6}", 0..8)) {
        let shown = block_on(async {
            let mut rt = connecting(SendPolicy::default(), true).await;
            rt.driver().inject_socket(SocketEvent::Opened);
            for text in &texts {
                rt.driver().inject_line(text);
            }
            drain(&mut rt).await;
            rt.app().view().unwrap().messages().iter().map(|m| m.content.clone()).collect::<Vec<_>>()
        });

        prop_assert_eq!(shown, texts);
    }

    /// The standard invariants hold under arbitrary event sequences.
    ///
    /// The driver checks them on every render; this also checks the final
    /// state.
    #[test]
    fn invariants_hold_under_random_steps(steps in prop::collection::vec(step_strategy(), 0..40)) {
        let result = block_on(async {
            let mut rt = connecting(SendPolicy::default(), true).await;
            for step in &steps {
                inject(rt.driver(), step);
                drain(&mut rt).await;
            }
            let snapshot = SystemSnapshot::capture(rt.app(), &rt.driver().wire());
            InvariantRegistry::standard().check_all(&snapshot)
        });

        prop_assert!(result.is_ok(), "violations: {:?}", result);
    }
}
