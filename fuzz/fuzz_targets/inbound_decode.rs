//! Fuzz target for Inbound::from_frame
//!
//! Server frames are untrusted text. This fuzzer feeds arbitrary strings and
//! arbitrary `type` tags with arbitrary payloads:
//! - Invalid JSON and non-object JSON
//! - Known tags with payloads of the wrong shape
//! - Unknown tags
//!
//! Decoding must NEVER panic. Every input is either a classified frame or an
//! error.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parlor_proto::{Frame, Inbound};

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(String),
    Tagged { kind: Tag, payload: String },
}

#[derive(Debug, Arbitrary)]
enum Tag {
    Message,
    ActiveUsers,
    Typing,
    Error,
    Other(String),
}

impl Tag {
    fn as_str(&self) -> &str {
        match self {
            Self::Message => "message",
            Self::ActiveUsers => "active_users",
            Self::Typing => "typing",
            Self::Error => "error",
            Self::Other(other) => other,
        }
    }
}

fuzz_target!(|input: Input| {
    let text = match &input {
        Input::Raw(raw) => raw.clone(),
        // Payload is spliced in verbatim so it may be any JSON, or none
        Input::Tagged { kind, payload } => {
            format!(r#"{{"type":{},"payload":{payload}}}"#, json_string(kind.as_str()))
        },
    };

    let frame = Frame::new(text);
    if let Ok(Inbound::Unknown { raw, .. }) = Inbound::from_frame(&frame) {
        assert_eq!(raw, frame.as_str(), "unknown frames must keep their raw text");
    }
});

fn json_string(s: &str) -> String {
    let escaped: String = s
        .chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        })
        .collect();
    format!("\"{escaped}\"")
}
