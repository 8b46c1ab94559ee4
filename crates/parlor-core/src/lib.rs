//! Parlor chat core
//!
//! Pure logic for the realtime chat layer, free of I/O:
//!
//! - [`room`]: the room resolver, finding or creating the private room shared
//!   by two users through a [`room::RoomDirectory`]
//! - [`connection`]: the per-view connection state machine, which returns
//!   [`connection::ConnectionAction`]s for a driver to execute
//! - [`error`]: the error taxonomy shared by every layer above

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod error;
pub mod room;

pub use connection::{Connection, ConnectionAction, ConnectionConfig, ConnectionState, SendPolicy};
pub use error::{ChatError, ConnectionError, DirectoryError, ResolutionError};
pub use room::{ChatRoom, Identity, RoomDirectory, find_room, resolve_room};
