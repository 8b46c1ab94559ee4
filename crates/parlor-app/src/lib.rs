//! Application layer for Parlor
//!
//! Pure state machines and a generic runtime for the chat view, so that the
//! same orchestration code runs in the terminal front end and in simulation.
//!
//! # Components
//!
//! - [`App`]: chat view state machine (activation, history, submission)
//! - [`Bridge`]: protocol bridge (owns the view's connection state machine)
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: generic orchestration loop over a driver and a room directory

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod driver;
mod event;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::App;
pub use bridge::{Bridge, TransportOp};
pub use driver::{Driver, DriverEvent, SocketId};
pub use event::AppEvent;
pub use input::UserInput;
pub use runtime::Runtime;
pub use state::{ChatView, ViewId, ViewStatus};
