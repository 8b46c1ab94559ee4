//! Text frame carried over the realtime channel.
//!
//! A `Frame` is the transport-layer unit: one websocket text message. It is a
//! pure data holder; see [`crate::Intent::to_frame`] and
//! [`crate::Inbound::from_frame`] for the logic-to-transport conversions.

use std::fmt;

/// One UTF-8 text message on the realtime channel.
///
/// Holds raw text, NOT a decoded value. Transports move frames without
/// looking inside them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    text: String,
}

impl Frame {
    /// Wrap raw frame text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Frame text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the frame, returning its text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Length of the frame text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the frame carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
