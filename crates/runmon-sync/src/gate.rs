//! What each resource observes and when it is still worth polling.

use std::time::Duration;

use runmon_core::{PollingConfig, RunState};
use runmon_ui::{AppState, DataKind, Resource, View};

use crate::poller::{DrainPolicy, Subject};

pub fn drain_policy(resource: Resource) -> DrainPolicy {
    match resource {
        Resource::Logs | Resource::Output | Resource::Results => DrainPolicy::FinalFetch,
        Resource::RunList | Resource::RunState | Resource::Branches | Resource::Commits => {
            DrainPolicy::Immediate
        }
    }
}

pub fn interval(resource: Resource, polling: &PollingConfig) -> Duration {
    match resource {
        Resource::RunList => polling.run_list(),
        Resource::RunState => polling.run_state(),
        Resource::Logs => polling.logs(),
        Resource::Output => polling.output(),
        Resource::Results => polling.results(),
        Resource::Branches => polling.branches(),
        Resource::Commits => polling.commits(),
    }
}

/// The entity `resource` should be observing in `state`, if any.
pub fn subject(resource: Resource, state: &AppState) -> Option<Subject> {
    match (&state.view, resource) {
        (View::Home(_), Resource::RunList) => Some(Subject::Mounted),
        (View::Home(home), Resource::Branches) if home.setup.is_open => Some(Subject::Mounted),
        (View::Home(home), Resource::Commits) if home.setup.is_open => home
            .setup
            .branch
            .as_ref()
            .map(|branch| Subject::Branch(branch.name.clone())),
        (
            View::Run(run_view),
            Resource::RunState | Resource::Logs | Resource::Output | Resource::Results,
        ) => run_view.run_id().map(Subject::Run),
        _ => None,
    }
}

/// False once polling `resource` can no longer bring anything new.
///
/// Run data keeps polling while the run is active, and after that until a
/// first value has been received, so a run that finished before it was ever
/// watched still shows its data.
pub fn keep_polling(resource: Resource, state: &AppState) -> bool {
    match (&state.view, resource) {
        (View::Home(_), Resource::RunList) => true,
        (View::Home(home), Resource::Branches) => home.setup.branches.is_none(),
        (View::Home(home), Resource::Commits) => home.setup.commits.is_none(),
        (View::Run(run_view), Resource::RunState) => {
            run_view.run.state.map_or(true, RunState::is_active)
        }
        (View::Run(run_view), Resource::Logs) => {
            run_view.run.is_active() || !run_view.has_received(DataKind::Logs)
        }
        (View::Run(run_view), Resource::Output) => {
            run_view.run.is_active() || !run_view.has_received(DataKind::Output)
        }
        (View::Run(run_view), Resource::Results) => {
            run_view.run.is_active() || !run_view.has_received(DataKind::Results)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use runmon_core::{Branch, Code, Run, RunId};
    use runmon_ui::{reduce, Action};

    fn run(state: Option<RunState>) -> Run {
        Run {
            id: Some(RunId(7)),
            code: Code {
                commit_hash: "abc123".to_string(),
                branch: "main".to_string(),
                description: "first".to_string(),
            },
            launched_at: Utc::now(),
            job_dir: "openmole".to_string(),
            output_dir: "output".to_string(),
            script: "sim.oms".to_string(),
            state,
        }
    }

    fn viewing(state: Option<RunState>) -> AppState {
        let mut app = AppState::default();
        reduce(&mut app, Action::OpenRunView { run: run(state) }).unwrap();
        app
    }

    #[test]
    fn home_observes_run_list_and_open_form() {
        let mut state = AppState::default();
        assert_eq!(subject(Resource::RunList, &state), Some(Subject::Mounted));
        assert_eq!(subject(Resource::Branches, &state), None);
        assert_eq!(subject(Resource::Logs, &state), None);

        reduce(&mut state, Action::OpenSetup).unwrap();
        assert_eq!(subject(Resource::Branches, &state), Some(Subject::Mounted));
        assert_eq!(subject(Resource::Commits, &state), None);

        reduce(
            &mut state,
            Action::SelectBranch {
                branch: Some(Branch::new("main")),
            },
        )
        .unwrap();
        assert_eq!(
            subject(Resource::Commits, &state),
            Some(Subject::Branch("main".to_string()))
        );
    }

    #[test]
    fn branch_list_stops_after_first_success() {
        let mut state = AppState::default();
        reduce(&mut state, Action::OpenSetup).unwrap();
        assert!(keep_polling(Resource::Branches, &state));
        reduce(
            &mut state,
            Action::SetBranchList {
                branches: vec![Branch::new("main")],
            },
        )
        .unwrap();
        assert!(!keep_polling(Resource::Branches, &state));
    }

    #[test]
    fn run_view_observes_run_id() {
        let state = viewing(Some(RunState::Running));
        for resource in [
            Resource::RunState,
            Resource::Logs,
            Resource::Output,
            Resource::Results,
        ] {
            assert_eq!(subject(resource, &state), Some(Subject::Run(RunId(7))));
            assert!(keep_polling(resource, &state));
        }
        assert_eq!(subject(Resource::RunList, &state), None);
    }

    #[test]
    fn finished_run_polls_data_until_first_value() {
        let mut state = viewing(Some(RunState::Finished));
        assert!(!keep_polling(Resource::RunState, &state));
        assert!(keep_polling(Resource::Output, &state));

        reduce(
            &mut state,
            Action::SetOutput {
                output: "done".to_string(),
            },
        )
        .unwrap();
        assert!(!keep_polling(Resource::Output, &state));
        assert!(keep_polling(Resource::Results, &state));
    }

    #[test]
    fn unknown_run_state_keeps_status_polling() {
        assert!(keep_polling(Resource::RunState, &viewing(None)));
    }

    #[test]
    fn run_data_drains_with_a_final_fetch() {
        assert_eq!(drain_policy(Resource::Logs), DrainPolicy::FinalFetch);
        assert_eq!(drain_policy(Resource::RunState), DrainPolicy::Immediate);
        assert_eq!(
            interval(Resource::Logs, &PollingConfig::default()),
            Duration::from_secs(1)
        );
    }
}
