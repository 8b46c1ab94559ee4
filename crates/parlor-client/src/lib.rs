//! Parlor client I/O adapters
//!
//! The edges of the chat core that actually touch the network:
//!
//! - [`HttpDirectory`]: the REST room directory (`/chats`, `/users`) over reqwest
//! - [`transport`]: the realtime websocket, bridged onto tokio channels
//! - [`ClientConfig`]: endpoints, session credential and send policy
//!
//! Protocol logic stays in the Sans-IO `parlor-core` state machines; this crate
//! only moves bytes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod http;
pub mod transport;

pub use config::{ClientConfig, DEFAULT_API_BASE, DEFAULT_SOCKET_URL};
pub use http::HttpDirectory;
pub use transport::{ConnectedSocket, SocketEvent, TransportError};
