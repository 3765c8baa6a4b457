//! Run lifecycle.
//!
//! The backend reports a run's state as a small integer. Once a run is
//! finished or failed it never goes back to running.

use serde::{Deserialize, Serialize};

/// Backend-reported state of a persisted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RunState {
    Running,
    Failed,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown run state code {0}; expected 1 (running), 2 (failed) or 3 (finished)")]
pub struct UnknownRunState(pub u8);

impl TryFrom<u8> for RunState {
    type Error = UnknownRunState;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(RunState::Running),
            2 => Ok(RunState::Failed),
            3 => Ok(RunState::Finished),
            other => Err(UnknownRunState(other)),
        }
    }
}

impl From<RunState> for u8 {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Running => 1,
            RunState::Failed => 2,
            RunState::Finished => 3,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Running => "running",
            RunState::Failed => "failed",
            RunState::Finished => "finished",
        }
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Finished | RunState::Failed)
    }

    /// Returns true while the run still produces output, logs and samples.
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running)
    }
}

/// Where a run sits from the client's point of view.
///
/// `Draft` is a run the user confirmed but the backend has not assigned an
/// id to yet. `Unknown` is a persisted run whose state was never fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLifecycle {
    Draft,
    Unknown,
    Running,
    Finished,
    Failed,
}

impl RunLifecycle {
    pub fn from_parts(persisted: bool, state: Option<RunState>) -> Self {
        match (persisted, state) {
            (false, _) => RunLifecycle::Draft,
            (true, None) => RunLifecycle::Unknown,
            (true, Some(RunState::Running)) => RunLifecycle::Running,
            (true, Some(RunState::Finished)) => RunLifecycle::Finished,
            (true, Some(RunState::Failed)) => RunLifecycle::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunLifecycle::Finished | RunLifecycle::Failed)
    }

    /// Returns true if a snapshot reporting `next` may replace this one.
    ///
    /// Terminal runs only accept the same terminal state again.
    pub fn admits(self, next: Option<RunState>) -> bool {
        match self {
            RunLifecycle::Finished => next == Some(RunState::Finished),
            RunLifecycle::Failed => next == Some(RunState::Failed),
            RunLifecycle::Running => next.is_some(),
            RunLifecycle::Draft | RunLifecycle::Unknown => true,
        }
    }
}
