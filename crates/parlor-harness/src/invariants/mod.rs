//! Chat view invariants.
//!
//! Scenario tests assert outcomes; invariants assert what may never be
//! observed at any point of a run, whatever the interleaving of typing,
//! socket events and server frames.
//!
//! Each check reads a [`SystemSnapshot`]: the current chat view as the user
//! would see it, plus the socket log recorded by the
//! [`crate::SimDriver`]. The driver captures one after every render when a
//! registry is installed:
//!
//! ```ignore
//! let driver = SimDriver::new().with_invariants(InvariantRegistry::standard());
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{JoinPrecedesMessages, PlaceholderExclusive, SingleLiveConnection};
pub use snapshot::{SystemSnapshot, ViewSnapshot, WireEntry};

/// Outcome of a single check.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Which invariant.
    pub invariant: &'static str,
    /// What was observed.
    pub message: String,
}

impl Violation {
    pub(crate) fn new(invariant: &'static str, message: impl Into<String>) -> Self {
        Self { invariant, message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property of the chat view and its socket log.
pub trait Invariant: Send + Sync {
    /// Stable identifier, used in violation reports.
    fn name(&self) -> &'static str;

    /// Inspect `state`.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Set of invariants run together.
#[derive(Default)]
pub struct InvariantRegistry {
    checks: Vec<Box<dyn Invariant>>,
}

impl fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.checks.iter().map(|c| c.name())).finish()
    }
}

impl InvariantRegistry {
    /// No checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// [`JoinPrecedesMessages`], [`PlaceholderExclusive`] and
    /// [`SingleLiveConnection`].
    pub fn standard() -> Self {
        Self::new().with(JoinPrecedesMessages).with(PlaceholderExclusive).with(SingleLiveConnection)
    }

    /// Builder form of [`InvariantRegistry::add`].
    #[must_use]
    pub fn with<I: Invariant + 'static>(mut self, invariant: I) -> Self {
        self.add(invariant);
        self
    }

    /// Register another check.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.checks.push(Box::new(invariant));
    }

    /// Run every check; collect all violations rather than stopping at the
    /// first.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> =
            self.checks.iter().filter_map(|check| check.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every check and panic with all violations, labelled with
    /// `context`.
    #[allow(clippy::panic, reason = "simulation assertion, only reachable from tests")]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        let Err(violations) = self.check_all(state) else {
            return;
        };

        let report: Vec<String> = violations.iter().map(ToString::to_string).collect();
        panic!("{} invariant(s) broken {context}:\n  {}", report.len(), report.join("\n  "));
    }

    /// Number of checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
