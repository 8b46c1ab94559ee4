//! Parlor wire protocol
//!
//! Types shared by everything that talks to the forum backend:
//!
//! - [`Frame`]: one UTF-8 text unit on the realtime channel
//! - [`Intent`]: outbound actions (join a room, send a message, typing)
//! - [`Inbound`]: server frames, dispatched on their `type` tag
//! - [`api`]: JSON bodies of the REST chat endpoints
//!
//! Frames are JSON objects of the shape `{"type": ..., "payload": ...}`. The
//! codec never fails on an unrecognised `type`; only input that is not a
//! well-formed JSON object (or a known type whose payload does not match its
//! schema) produces a [`ProtocolError`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod errors;
mod frame;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use payloads::{
    Inbound, Intent,
    chat::{ChatMessage, ErrorPayload, RoomHash, TypingNotice, User, UserId},
};
