/// Page state definitions for tracking crawl progress
use crate::{PrerenderError, Result};
use serde::Serialize;
use std::fmt;

/// Represents the current state of a route in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    // ===== Active States =====
    /// Route is in the frontier, waiting for a worker slot
    Queued,

    /// Route has been handed to a worker and is being rendered
    InFlight,

    // ===== Terminal States =====
    /// Route was rendered and its output file written
    Completed,

    /// Rendering or writing failed; never retried
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the route still occupies the frontier or a worker
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::InFlight)
    }

    /// Returns true if this represents a successful render
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::InFlight)
                | (Self::InFlight, Self::Completed)
                | (Self::InFlight, Self::Failed)
        )
    }

    /// Returns the next state, or an error if the transition is illegal
    pub fn transition(self, next: PageState) -> Result<PageState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PrerenderError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InFlight => "in_flight",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
