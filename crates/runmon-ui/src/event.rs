use runmon_core::{Branch, Commit, FailureReport, LogCollection, ResultSet, Run};
use runmon_notify::Notification;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::model::{DataKind, Scope};

/// Polled or requested remote resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    RunList,
    RunState,
    Logs,
    Output,
    Results,
    Branches,
    Commits,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::RunList,
        Resource::RunState,
        Resource::Logs,
        Resource::Output,
        Resource::Results,
        Resource::Branches,
        Resource::Commits,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::RunList => "run_list",
            Resource::RunState => "run_state",
            Resource::Logs => "logs",
            Resource::Output => "output",
            Resource::Results => "results",
            Resource::Branches => "branches",
            Resource::Commits => "commits",
        }
    }

    /// Slot that reports this resource's failures.
    pub fn scope(self) -> Scope {
        match self {
            Resource::RunList => Scope::RunList,
            Resource::RunState => Scope::Run,
            Resource::Logs => Scope::Logs,
            Resource::Output => Scope::Output,
            Resource::Results => Scope::Results,
            Resource::Branches | Resource::Commits => Scope::Setup,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one remote call, ready to be turned into an action.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    RunList(Result<Vec<Run>, FailureReport>),
    RunState(Result<Run, FailureReport>),
    Logs(Result<LogCollection, FailureReport>),
    Output(Result<String, FailureReport>),
    Results(Result<ResultSet, FailureReport>),
    Branches(Result<Vec<Branch>, FailureReport>),
    Commits(Result<Vec<Commit>, FailureReport>),
    Launch(Result<Run, FailureReport>),
}

impl FetchEvent {
    /// `None` for a launch, which is not a polled resource.
    pub fn resource(&self) -> Option<Resource> {
        match self {
            FetchEvent::RunList(_) => Some(Resource::RunList),
            FetchEvent::RunState(_) => Some(Resource::RunState),
            FetchEvent::Logs(_) => Some(Resource::Logs),
            FetchEvent::Output(_) => Some(Resource::Output),
            FetchEvent::Results(_) => Some(Resource::Results),
            FetchEvent::Branches(_) => Some(Resource::Branches),
            FetchEvent::Commits(_) => Some(Resource::Commits),
            FetchEvent::Launch(_) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            FetchEvent::RunList(result) => result.is_ok(),
            FetchEvent::RunState(result) | FetchEvent::Launch(result) => result.is_ok(),
            FetchEvent::Logs(result) => result.is_ok(),
            FetchEvent::Output(result) => result.is_ok(),
            FetchEvent::Results(result) => result.is_ok(),
            FetchEvent::Branches(result) => result.is_ok(),
            FetchEvent::Commits(result) => result.is_ok(),
        }
    }

    /// Failures become a `DomainError` on the slot of the view that asked,
    /// except a missing output or sample, which only means "not yet".
    pub fn into_action(self) -> Action {
        match self {
            FetchEvent::RunList(Ok(runs)) => Action::SetRunList { runs },
            FetchEvent::RunState(Ok(run)) => Action::SetRun { run },
            FetchEvent::Logs(Ok(logs)) => Action::AppendLogs { logs },
            FetchEvent::Output(Ok(output)) => Action::SetOutput { output },
            FetchEvent::Results(Ok(results)) => Action::SetResults { results },
            FetchEvent::Branches(Ok(branches)) => Action::SetBranchList { branches },
            FetchEvent::Commits(Ok(commits)) => Action::SetCommitList { commits },
            FetchEvent::Launch(Ok(run)) => Action::LaunchSucceeded { run },
            FetchEvent::Launch(Err(error)) => Action::LaunchFailed { error },
            FetchEvent::Output(Err(error)) if error.is_not_found() => Action::NoDataYet {
                kind: DataKind::Output,
            },
            FetchEvent::Results(Err(error)) if error.is_not_found() => Action::NoDataYet {
                kind: DataKind::Results,
            },
            FetchEvent::RunList(Err(error)) => domain_error(Resource::RunList, error),
            FetchEvent::RunState(Err(error)) => domain_error(Resource::RunState, error),
            FetchEvent::Logs(Err(error)) => domain_error(Resource::Logs, error),
            FetchEvent::Output(Err(error)) => domain_error(Resource::Output, error),
            FetchEvent::Results(Err(error)) => domain_error(Resource::Results, error),
            FetchEvent::Branches(Err(error)) => domain_error(Resource::Branches, error),
            FetchEvent::Commits(Err(error)) => domain_error(Resource::Commits, error),
        }
    }
}

fn domain_error(resource: Resource, error: FailureReport) -> Action {
    Action::SetNotification {
        scope: resource.scope(),
        notification: Notification::DomainError(error),
    }
}
