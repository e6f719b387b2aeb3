//! Traversal state definitions
//!
//! The walk starts `Running` and ends in exactly one terminal state. The
//! terminal states are informational: all of them hand back the same kind of
//! result, a (possibly partial) ordered URL list.
use std::fmt;

/// Why a walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The page budget (`max_pages`) was reached
    Budget,

    /// The oracle found no next link, or the link could not be resolved
    NoNext,

    /// The next link points to a page already recorded
    LoopDetected,

    /// The current page could not be fetched
    FetchFailed,

    /// The walk was cancelled from outside (e.g. Ctrl-C)
    Interrupted,
}

impl StopReason {
    /// Returns true if the walk ended because something went wrong
    ///
    /// Budget, no-next and loop detection are normal endings.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::Interrupted)
    }

    /// Short machine-readable tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::NoNext => "no_next",
            Self::LoopDetected => "loop_detected",
            Self::FetchFailed => "fetch_failed",
            Self::Interrupted => "interrupted",
        }
    }

    /// Human-readable explanation for logs
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Budget => "reached the maximum page limit",
            Self::NoNext => "no further page found",
            Self::LoopDetected => "next link points back to a visited page",
            Self::FetchFailed => "failed to fetch the current page",
            Self::Interrupted => "interrupted before completion",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current state of the traversal state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkState {
    #[default]
    Running,
    Stopped(StopReason),
}

impl WalkState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// The stop reason, if the walk has terminated
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Running => None,
            Self::Stopped(reason) => Some(*reason),
        }
    }
}

impl fmt::Display for WalkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped(reason) => write!(f, "stopped_{}", reason),
        }
    }
}
