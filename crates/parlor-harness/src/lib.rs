//! Deterministic simulation harness for the Parlor chat layer.
//!
//! In-memory implementations of the [`parlor_core::RoomDirectory`] and
//! [`parlor_app::Driver`] traits, so the production [`parlor_app::Runtime`]
//! can be driven step by step without a network.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the chat view
//! invariants; [`SimDriver::with_invariants`] checks them on every render.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_directory;
pub mod sim_driver;

pub use invariants::{
    Invariant, InvariantRegistry, InvariantResult, JoinPrecedesMessages, PlaceholderExclusive,
    SingleLiveConnection, SystemSnapshot, ViewSnapshot, Violation, WireEntry,
};
pub use sim_directory::{CallCounts, DirectoryCall, SimDirectory};
pub use sim_driver::{SimDriver, SimDriverError};
