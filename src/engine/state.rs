// src/engine/state.rs

//! Lifecycle of a single Run invocation.
//!
//! ```text
//! Building -> Piped -> Started -> Streaming -> Exited -> Reported
//!    |          |         |                                ^
//!    +----------+---------+------------ error -------------+
//! ```
//!
//! In pseudo-terminal mode `Piped` means "terminal allocated".

use std::fmt;

use anyhow::anyhow;
use tracing::trace;

use crate::errors::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Building,
    Piped,
    Started,
    Streaming,
    Exited,
    Reported,
}

impl RunState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Building, Piped)
                | (Piped, Started)
                | (Started, Streaming)
                | (Streaming, Exited)
                | (Exited, Reported)
                | (Building | Piped | Started, Reported)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// State tracker for one invocation. Single-use.
#[derive(Debug)]
pub struct Invocation {
    id: u64,
    state: RunState,
}

impl Invocation {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            state: RunState::Building,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn advance(&mut self, next: RunState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(EngineError::Other(anyhow!(
                "invocation {}: illegal transition {} -> {}",
                self.id,
                self.state,
                next
            )));
        }
        trace!(invocation = self.id, from = %self.state, to = %next, "run state");
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_walks_every_state() {
        let mut inv = Invocation::new(7);
        for next in [
            RunState::Piped,
            RunState::Started,
            RunState::Streaming,
            RunState::Exited,
            RunState::Reported,
        ] {
            inv.advance(next).unwrap();
        }
        assert_eq!(inv.state(), RunState::Reported);
    }

    #[test]
    fn early_error_edges_go_straight_to_reported() {
        for start in [RunState::Building, RunState::Piped, RunState::Started] {
            assert!(start.can_advance_to(RunState::Reported));
        }
        assert!(!RunState::Streaming.can_advance_to(RunState::Reported));
    }

    #[test]
    fn states_are_never_reentered() {
        let mut inv = Invocation::new(1);
        inv.advance(RunState::Reported).unwrap();
        assert!(inv.advance(RunState::Reported).is_err());
        assert!(inv.advance(RunState::Building).is_err());
        assert!(!RunState::Started.can_advance_to(RunState::Piped));
    }
}
