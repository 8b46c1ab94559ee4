//! Terminal front end for Parlor
//!
//! A thin shell over [`parlor_app::Driver`] that provides line-oriented
//! terminal I/O. All orchestration logic lives in the generic
//! [`parlor_app::Runtime`].
//!
//! Input is one line at a time: plain text is sent to the open chat, and
//! `/open <id>`, `/typing`, `/close` and `/quit` are commands.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod render;
pub mod terminal;

pub use render::Transcript;
pub use terminal::{TerminalDriver, TerminalError};
