//! # Domain Value Objects
//!
//! Connector constants, pool submission outcome and the event channel state
//! machine.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Protocol kind of this connector, also the prefix of every event source.
pub const CONNECTOR_KIND: &str = "fftokens";

/// WebSocket path used when none is configured.
pub const DEFAULT_WS_PATH: &str = "/api/ws";

/// Outcome of a create/activate pool command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolSubmission {
    /// The connector answered synchronously and the pool record was delivered.
    Complete,
    /// The pool record will arrive later as a `token-pool` event.
    Pending,
}

impl PoolSubmission {
    /// True if the pool record was already delivered.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Event channel lifecycle.
///
/// ```text
/// Disconnected -> Connecting -> Receiving <-> Acknowledging
///       |              |            |              |
///       +--------------+------------+--------------+--> Closed
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelState {
    /// Initialised, `start` not yet called.
    #[default]
    Disconnected,
    /// `start` is opening the connection.
    Connecting,
    /// Waiting for or processing inbound frames.
    Receiving,
    /// Writing an ack frame.
    Acknowledging,
    /// Terminated. A new connector is needed to reconnect.
    Closed,
}

impl ChannelState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: ChannelState) -> bool {
        match (self, next) {
            (Self::Closed, _) => false,
            (_, Self::Closed) => true,
            (Self::Disconnected, Self::Connecting) => true,
            (Self::Connecting, Self::Receiving) => true,
            (Self::Receiving, Self::Acknowledging) => true,
            (Self::Acknowledging, Self::Receiving) => true,
            _ => false,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Receiving => "receiving",
            Self::Acknowledging => "acknowledging",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Rejected state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidTransition {
    /// State at the time of the attempt
    pub from: ChannelState,
    /// Requested state
    pub to: ChannelState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid channel transition: {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

/// Shared, observable channel state.
///
/// Written by the facade (`start`) and the event loop; read by anyone
/// holding a clone.
#[derive(Clone, Debug, Default)]
pub struct ChannelStatus(Arc<RwLock<ChannelState>>);

impl ChannelStatus {
    /// New status in `Disconnected`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn current(&self) -> ChannelState {
        *self.0.read()
    }

    /// Move to `next`. Re-entering the current state is a no-op.
    pub fn transition(&self, next: ChannelState) -> Result<(), InvalidTransition> {
        let mut state = self.0.write();
        if *state == next {
            return Ok(());
        }
        if !state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: *state,
                to: next,
            });
        }
        *state = next;
        Ok(())
    }

    /// Move to `next` only if the state is currently `expected`.
    pub fn transition_from(&self, expected: ChannelState, next: ChannelState) -> bool {
        let mut state = self.0.write();
        if *state != expected || !state.can_transition_to(next) {
            return false;
        }
        *state = next;
        true
    }

    /// Enter the terminal state.
    pub fn close(&self) {
        *self.0.write() = ChannelState::Closed;
    }
}
