use std::sync::Arc;

use chrono::{DateTime, Utc};
use runmon_client::{ClientError, RunBackend, SourceRepository};
use runmon_core::{last_timestamp, Run, RunId};
use runmon_ui::{AppState, FetchEvent, Resource};
use tracing::warn;

use crate::poller::Subject;

/// One remote call with its arguments resolved from the state at issue time.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    RunList,
    RunState(RunId),
    Logs { run: RunId, since: DateTime<Utc> },
    Output(RunId),
    Results(RunId),
    Branches,
    Commits { branch: String },
    Launch(Box<Run>),
}

impl FetchRequest {
    /// Request for a poll of `resource` observing `subject`.
    pub fn for_poll(resource: Resource, subject: &Subject, state: &AppState) -> Option<Self> {
        let request = match (resource, subject) {
            (Resource::RunList, Subject::Mounted) => FetchRequest::RunList,
            (Resource::Branches, Subject::Mounted) => FetchRequest::Branches,
            (Resource::Commits, Subject::Branch(branch)) => FetchRequest::Commits {
                branch: branch.clone(),
            },
            (Resource::RunState, Subject::Run(id)) => FetchRequest::RunState(*id),
            (Resource::Output, Subject::Run(id)) => FetchRequest::Output(*id),
            (Resource::Results, Subject::Run(id)) => FetchRequest::Results(*id),
            (Resource::Logs, Subject::Run(id)) => {
                let held = state.run_view().and_then(|view| view.logs.logs.as_ref());
                FetchRequest::Logs {
                    run: *id,
                    since: last_timestamp(held),
                }
            }
            _ => return None,
        };
        Some(request)
    }

    pub async fn execute(
        self,
        backend: Arc<dyn RunBackend>,
        source: Arc<dyn SourceRepository>,
    ) -> FetchEvent {
        match self {
            FetchRequest::RunList => FetchEvent::RunList(report(backend.fetch_all_runs().await)),
            FetchRequest::RunState(id) => FetchEvent::RunState(report(backend.fetch_run(id).await)),
            FetchRequest::Logs { run, since } => {
                FetchEvent::Logs(report(backend.fetch_new_logs(run, since).await))
            }
            FetchRequest::Output(id) => {
                FetchEvent::Output(report(backend.fetch_run_output(id).await))
            }
            FetchRequest::Results(id) => {
                FetchEvent::Results(report(backend.fetch_run_results(id).await))
            }
            FetchRequest::Branches => FetchEvent::Branches(report(source.fetch_branches().await)),
            FetchRequest::Commits { branch } => {
                FetchEvent::Commits(report(source.fetch_commits(&branch).await))
            }
            FetchRequest::Launch(draft) => FetchEvent::Launch(report(backend.launch_run(&draft).await)),
        }
    }
}

fn report<T>(result: Result<T, ClientError>) -> Result<T, runmon_core::FailureReport> {
    result.map_err(|err| {
        if !err.is_not_found() {
            warn!(kind = ?err.kind(), "{err}");
        }
        err.report()
    })
}
