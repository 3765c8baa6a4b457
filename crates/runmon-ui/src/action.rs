use runmon_core::{Branch, Commit, FailureReport, LogCollection, ResultSet, Run};
use runmon_notify::Notification;
use serde::{Deserialize, Serialize};

use crate::model::{DataKind, Scope};

/// Every state transition the client knows about.
///
/// Decoding a `type` tag outside this set fails, so an unknown action never
/// reaches the reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    OpenRunView { run: Run },
    CloseRunView,
    SetRun { run: Run },
    SetRunList { runs: Vec<Run> },
    AddRun { run: Run },
    SetLogs { logs: LogCollection },
    AppendLogs { logs: LogCollection },
    SetOutput { output: String },
    SetResults { results: ResultSet },
    /// A fetch succeeded but the backend has nothing for this resource yet.
    NoDataYet { kind: DataKind },
    SetNotification { scope: Scope, notification: Notification },
    OpenSetup,
    CloseSetup,
    SetBranchList { branches: Vec<Branch> },
    SelectBranch { branch: Option<Branch> },
    SetCommitList { commits: Vec<Commit> },
    SelectCommit { commit: Option<Commit> },
    SetJobDir { value: String },
    SetOutputDir { value: String },
    SetScript { value: String },
    ConfirmLaunch,
    LaunchSucceeded { run: Run },
    LaunchFailed { error: FailureReport },
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::OpenRunView { .. } => "open_run_view",
            Action::CloseRunView => "close_run_view",
            Action::SetRun { .. } => "set_run",
            Action::SetRunList { .. } => "set_run_list",
            Action::AddRun { .. } => "add_run",
            Action::SetLogs { .. } => "set_logs",
            Action::AppendLogs { .. } => "append_logs",
            Action::SetOutput { .. } => "set_output",
            Action::SetResults { .. } => "set_results",
            Action::NoDataYet { .. } => "no_data_yet",
            Action::SetNotification { .. } => "set_notification",
            Action::OpenSetup => "open_setup",
            Action::CloseSetup => "close_setup",
            Action::SetBranchList { .. } => "set_branch_list",
            Action::SelectBranch { .. } => "select_branch",
            Action::SetCommitList { .. } => "set_commit_list",
            Action::SelectCommit { .. } => "select_commit",
            Action::SetJobDir { .. } => "set_job_dir",
            Action::SetOutputDir { .. } => "set_output_dir",
            Action::SetScript { .. } => "set_script",
            Action::ConfirmLaunch => "confirm_launch",
            Action::LaunchSucceeded { .. } => "launch_succeeded",
            Action::LaunchFailed { .. } => "launch_failed",
        }
    }
}

/// Whether a reduction touched the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Changed,
    Unchanged,
}

impl Change {
    pub fn is_changed(self) -> bool {
        matches!(self, Change::Changed)
    }

    pub fn or(self, other: Change) -> Change {
        if self.is_changed() || other.is_changed() {
            Change::Changed
        } else {
            Change::Unchanged
        }
    }
}

impl From<bool> for Change {
    fn from(changed: bool) -> Self {
        if changed {
            Change::Changed
        } else {
            Change::Unchanged
        }
    }
}
