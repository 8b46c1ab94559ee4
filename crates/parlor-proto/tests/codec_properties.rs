//! Property-based tests for the realtime codec
//!
//! The decoder faces whatever the server (or a broken proxy) sends, so these
//! tests throw arbitrary text and arbitrary tags at it and check that it
//! classifies instead of failing.

use parlor_proto::{Frame, Inbound, Intent, ProtocolError, RoomHash};
use proptest::prelude::*;

const KNOWN_TAGS: &[&str] = &["message", "active_users", "typing", "error"];

fn arbitrary_room_hash() -> impl Strategy<Value = RoomHash> {
    "[a-f0-9]{1,32}".prop_map(RoomHash::new)
}

fn arbitrary_intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        arbitrary_room_hash().prop_map(|room_hash| Intent::JoinRoom { room_hash }),
        (any::<String>(), arbitrary_room_hash())
            .prop_map(|(content, room_hash)| Intent::SendMessage { content, room_hash }),
        arbitrary_room_hash().prop_map(|room_hash| Intent::Typing { room_hash }),
    ]
}

#[test]
fn prop_arbitrary_text_never_panics() {
    proptest!(|(text in any::<String>())| {
        // PROPERTY: decode either classifies or reports an error, nothing else
        let _ = Inbound::from_frame(&Frame::new(text));
    });
}

#[test]
fn prop_unknown_tags_are_never_errors() {
    proptest!(|(tag in "[a-z_]{1,20}", body in any::<u32>())| {
        prop_assume!(!KNOWN_TAGS.contains(&tag.as_str()));

        let text = serde_json::json!({ "type": tag, "payload": { "n": body } }).to_string();
        let decoded = Inbound::from_frame(&Frame::new(text.clone()));

        // PROPERTY: unrecognised frames decode to Unknown carrying the raw text
        prop_assert_eq!(decoded, Ok(Inbound::Unknown { kind: Some(tag), raw: text }));
    });
}

#[test]
fn prop_non_object_json_is_decode_error() {
    proptest!(|(n in any::<i64>(), s in "[a-z ]{0,16}")| {
        for text in [n.to_string(), serde_json::json!(s).to_string(), format!("[{n}]")] {
            let decoded = Inbound::from_frame(&Frame::new(text));
            prop_assert!(matches!(decoded, Err(ProtocolError::Decode(_))));
        }
    });
}

#[test]
fn prop_intent_frames_are_tagged_objects() {
    proptest!(|(intent in arbitrary_intent())| {
        let frame = intent.to_frame().expect("encode should succeed");
        let value: serde_json::Value =
            serde_json::from_str(frame.as_str()).expect("frame should be JSON");

        // PROPERTY: every outbound frame carries its tag and the target room
        prop_assert_eq!(value["type"].as_str(), Some(intent.kind()));
        prop_assert_eq!(value["payload"]["roomHash"].as_str(), Some(intent.room_hash().as_str()));
    });
}

#[test]
fn prop_sent_message_text_survives_encoding() {
    proptest!(|(content in any::<String>(), room_hash in arbitrary_room_hash())| {
        let intent = Intent::SendMessage { content: content.clone(), room_hash };
        let frame = intent.to_frame().expect("encode should succeed");
        let value: serde_json::Value =
            serde_json::from_str(frame.as_str()).expect("frame should be JSON");

        prop_assert_eq!(value["payload"]["message"].as_str(), Some(content.as_str()));
    });
}
