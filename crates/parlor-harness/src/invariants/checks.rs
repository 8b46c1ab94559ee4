//! The standard chat view checks.
//!
//! The wire checks replay the socket log from the start on every call, so
//! they see every socket the driver ever dialed.

use parlor_proto::Intent;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation, WireEntry};

/// The join is the first thing written to every socket.
///
/// Any `message` or `typing` frame on a socket must be preceded by a
/// `join_room` frame on that same socket.
pub struct JoinPrecedesMessages;

impl Invariant for JoinPrecedesMessages {
    fn name(&self) -> &'static str {
        "join_precedes_messages"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut socket = 0usize;
        let mut joined = false;

        for (at, entry) in state.wire.iter().enumerate() {
            match entry {
                WireEntry::Dial => {
                    socket += 1;
                    joined = false;
                },
                WireEntry::Sent(frame) => match Intent::from_frame(frame) {
                    Ok(Intent::JoinRoom { .. }) => joined = true,
                    Ok(intent) if !joined => {
                        let kind = intent.kind();
                        return Err(Violation::new(
                            self.name(),
                            format!("socket {socket}: {kind} frame at #{at} before join"),
                        ));
                    },
                    Ok(_) => {},
                    Err(e) => {
                        return Err(Violation::new(
                            self.name(),
                            format!("socket {socket}: undecodable frame at #{at}: {e}"),
                        ));
                    },
                },
                WireEntry::Disconnect | WireEntry::Dropped => {},
            }
        }
        Ok(())
    }
}

/// The placeholder row never shares the screen with a message row.
///
/// At most one placeholder is shown, and only while no message is.
pub struct PlaceholderExclusive;

impl Invariant for PlaceholderExclusive {
    fn name(&self) -> &'static str {
        "placeholder_exclusive"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(view) = &state.view else {
            return Ok(());
        };

        if view.placeholder_count > 1 || (view.placeholder_count == 1 && view.message_count > 0) {
            return Err(Violation::new(
                self.name(),
                format!(
                    "{}: {} placeholder(s) with {} message(s)",
                    view.id, view.placeholder_count, view.message_count
                ),
            ));
        }
        Ok(())
    }
}

/// At most one socket is live at any time.
///
/// A dial is only allowed once the previous socket was disconnected or
/// dropped.
pub struct SingleLiveConnection;

impl Invariant for SingleLiveConnection {
    fn name(&self) -> &'static str {
        "single_live_connection"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut live = false;

        for (at, entry) in state.wire.iter().enumerate() {
            match entry {
                WireEntry::Dial if live => {
                    return Err(Violation::new(
                        self.name(),
                        format!("dial at #{at} while another socket is live"),
                    ));
                },
                WireEntry::Dial => live = true,
                WireEntry::Sent(_) if !live => {
                    return Err(Violation::new(self.name(), format!("frame sent at #{at} with no live socket")));
                },
                WireEntry::Sent(_) => {},
                WireEntry::Disconnect | WireEntry::Dropped => live = false,
            }
        }
        Ok(())
    }
}
