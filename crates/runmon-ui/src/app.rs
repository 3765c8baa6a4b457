//! The reducer: the one place the client state changes.

use runmon_core::{LogCollection, Run};
use runmon_notify::{Notification, NotificationSlot};
use tracing::{debug, warn};

use crate::action::{Action, Change};
use crate::error::ReduceError;
use crate::model::{AppState, DataKind, HomeView, RunView, Scope, View};

/// Apply `action` to `state`.
///
/// Returns `Change::Unchanged` when the action carried nothing new; the state
/// is then left exactly as it was, buffers included.
pub fn reduce(state: &mut AppState, action: Action) -> Result<Change, ReduceError> {
    let label = action.label();
    let view = state.view.name();
    let wrong_view = || ReduceError::WrongView {
        action: label,
        view,
    };

    let change = match action {
        Action::OpenRunView { run } => {
            if !matches!(state.view, View::Home(_)) {
                return Err(wrong_view());
            }
            state.view = View::Run(RunView::new(run));
            Change::Changed
        }
        Action::CloseRunView => {
            if !matches!(state.view, View::Run(_)) {
                return Err(wrong_view());
            }
            state.view = View::Home(HomeView::new(&state.launch_defaults));
            Change::Changed
        }
        Action::SetNotification {
            scope,
            notification,
        } => {
            let slot = slot_mut(state, scope).ok_or_else(wrong_view)?;
            Change::from(slot.set(notification))
        }
        action => match &mut state.view {
            View::Home(home) => reduce_home(home, action).ok_or_else(wrong_view)??,
            View::Run(run_view) => reduce_run(run_view, action).ok_or_else(wrong_view)??,
        },
    };

    if change.is_changed() {
        debug!(action = label, view = state.view.name(), "state changed");
    }
    Ok(change)
}

fn slot_mut(state: &mut AppState, scope: Scope) -> Option<&mut NotificationSlot> {
    match &mut state.view {
        View::Home(home) => home.slot_mut(scope),
        View::Run(run_view) => run_view.slot_mut(scope),
    }
}

/// `None` when `action` does not belong to the home view.
fn reduce_home(home: &mut HomeView, action: Action) -> Option<Result<Change, ReduceError>> {
    let setup = &mut home.setup;
    let change = match action {
        Action::SetRunList { runs } => {
            let list = &mut home.run_list;
            let replaced = if list.runs.as_ref() != Some(&runs) {
                list.runs = Some(runs);
                true
            } else {
                false
            };
            Change::from(replaced).or(clear_domain_error(&mut list.notification))
        }
        Action::AddRun { run } => add_run(home, run),
        Action::OpenSetup => Change::from(!std::mem::replace(&mut setup.is_open, true)),
        Action::CloseSetup => {
            let was_open = std::mem::replace(&mut setup.is_open, false);
            let had_branches = setup.branches.take().is_some();
            Change::from(was_open || had_branches)
        }
        Action::SetBranchList { branches } => {
            let changed = set_if_different(&mut setup.branches, branches);
            Change::from(changed).or(clear_domain_error(&mut setup.notification))
        }
        Action::SelectBranch { branch } => {
            if setup.branch == branch {
                Change::Unchanged
            } else {
                setup.branch = branch;
                setup.commits = None;
                setup.commit = None;
                Change::Changed
            }
        }
        Action::SetCommitList { commits } => {
            let changed = set_if_different(&mut setup.commits, commits);
            Change::from(changed).or(clear_domain_error(&mut setup.notification))
        }
        Action::SelectCommit { commit } => {
            if setup.commit == commit {
                Change::Unchanged
            } else {
                setup.commit = commit;
                Change::Changed
            }
        }
        Action::SetJobDir { value } => replace_text(&mut setup.job_dir, value),
        Action::SetOutputDir { value } => replace_text(&mut setup.output_dir, value),
        Action::SetScript { value } => replace_text(&mut setup.script, value),
        Action::ConfirmLaunch => {
            if let Err(err) = setup.launch_ready() {
                return Some(Err(err));
            }
            Change::from(home.run_list.notification.set(Notification::LaunchInitiated))
        }
        Action::LaunchSucceeded { run } => {
            let notified = home
                .run_list
                .notification
                .set(Notification::LaunchSucceeded(run.clone()));
            let added = add_run(home, run);
            let closed = std::mem::replace(&mut home.setup.is_open, false);
            Change::from(notified || closed).or(added)
        }
        Action::LaunchFailed { error } => Change::from(
            home.run_list
                .notification
                .set(Notification::LaunchFailed(error)),
        ),
        _ => return None,
    };
    Some(Ok(change))
}

/// `None` when `action` does not belong to the run view.
fn reduce_run(run_view: &mut RunView, action: Action) -> Option<Result<Change, ReduceError>> {
    let change = match action {
        Action::SetRun { run } => match set_run(run_view, run) {
            Ok(change) => change,
            Err(err) => return Some(Err(err)),
        },
        Action::SetLogs { logs } => {
            let view = &mut run_view.logs;
            let changed = set_if_different(&mut view.logs, logs);
            Change::from(changed).or(Change::from(view.notification.clear()))
        }
        Action::AppendLogs { logs } => append_logs(run_view, logs),
        Action::SetOutput { output } => {
            if output.is_empty() {
                no_data_yet(run_view, DataKind::Output)
            } else {
                let view = &mut run_view.output;
                let changed = set_if_different(&mut view.output, output);
                Change::from(changed).or(Change::from(view.notification.clear()))
            }
        }
        Action::SetResults { results } => {
            if results.is_empty() {
                no_data_yet(run_view, DataKind::Results)
            } else {
                let view = &mut run_view.results;
                let changed = set_if_different(&mut view.results, results);
                Change::from(changed).or(Change::from(view.notification.clear()))
            }
        }
        Action::NoDataYet { kind } => no_data_yet(run_view, kind),
        _ => return None,
    };
    Some(Ok(change))
}

fn set_run(run_view: &mut RunView, run: Run) -> Result<Change, ReduceError> {
    if run.id != run_view.run.id {
        return Err(ReduceError::run_mismatch(run_view.run.id, run.id));
    }
    if run_view.run == run {
        return Ok(clear_domain_error(&mut run_view.notification));
    }
    let current = run_view.run.lifecycle();
    if !current.admits(run.state) {
        warn!(
            run = ?run.id,
            ?current,
            reported = ?run.state,
            "ignoring run snapshot that would leave a terminal state"
        );
        return Ok(Change::Unchanged);
    }
    run_view.run = run;
    clear_domain_error(&mut run_view.notification);
    Ok(Change::Changed)
}

fn append_logs(run_view: &mut RunView, incoming: LogCollection) -> Change {
    if incoming.is_empty() {
        return if run_view.logs.logs.is_none() {
            no_data_yet(run_view, DataKind::Logs)
        } else {
            clear_domain_error(&mut run_view.logs.notification)
        };
    }
    let view = &mut run_view.logs;
    view.notification.clear();
    view.logs.get_or_insert_with(LogCollection::new).append(incoming);
    Change::Changed
}

/// A successful fetch with nothing in it yet.
fn no_data_yet(run_view: &mut RunView, kind: DataKind) -> Change {
    if run_view.has_received(kind) {
        return Change::Unchanged;
    }
    let slot = match kind {
        DataKind::Logs => &mut run_view.logs.notification,
        DataKind::Output => &mut run_view.output.notification,
        DataKind::Results => &mut run_view.results.notification,
    };
    Change::from(slot.set(Notification::plain(kind.waiting_message())))
}

fn add_run(home: &mut HomeView, run: Run) -> Change {
    let runs = home.run_list.runs.get_or_insert_with(Vec::new);
    if runs.first() == Some(&run) {
        return Change::Unchanged;
    }
    if let Some(id) = run.id {
        runs.retain(|existing| existing.id != Some(id));
    }
    runs.insert(0, run);
    Change::Changed
}

fn clear_domain_error(slot: &mut NotificationSlot) -> Change {
    if matches!(slot.get(), Notification::DomainError(_)) {
        Change::from(slot.clear())
    } else {
        Change::Unchanged
    }
}

fn set_if_different<T: PartialEq>(target: &mut Option<T>, value: T) -> bool {
    if target.as_ref() == Some(&value) {
        return false;
    }
    *target = Some(value);
    true
}

fn replace_text(target: &mut String, value: String) -> Change {
    if *target == value {
        return Change::Unchanged;
    }
    *target = value;
    Change::Changed
}

/// Owns the state and counts effective changes, so observers can compare
/// revisions instead of whole trees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunMonitorApp {
    pub state: AppState,
    revision: u64,
}

impl RunMonitorApp {
    pub fn new(state: AppState) -> Self {
        Self { state, revision: 0 }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn apply(&mut self, action: Action) -> Result<Change, ReduceError> {
        let change = reduce(&mut self.state, action)?;
        if change.is_changed() {
            self.revision += 1;
        }
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use runmon_core::timestamp::from_unix_seconds;
    use runmon_core::{
        Branch, Code, Commit, FailureKind, FailureReport, LogEntry, PosteriorSamplePoint, RunId,
        RunState,
    };

    fn run(id: u64, state: Option<RunState>) -> Run {
        Run {
            id: Some(RunId(id)),
            code: Code {
                commit_hash: "abc123".to_string(),
                branch: "main".to_string(),
                description: "first".to_string(),
            },
            launched_at: Utc.with_ymd_and_hms(2023, 5, 2, 8, 0, 0).unwrap(),
            job_dir: "openmole".to_string(),
            output_dir: "output".to_string(),
            script: "sim.oms".to_string(),
            state,
        }
    }

    fn logs(items: &[(&str, f64, &str)]) -> LogCollection {
        items
            .iter()
            .map(|(context, at, out)| {
                (
                    *context,
                    LogEntry {
                        timestamp: from_unix_seconds(*at).unwrap(),
                        stdout: out.to_string(),
                        stderr: String::new(),
                    },
                )
            })
            .collect()
    }

    fn network_failure() -> FailureReport {
        FailureReport {
            kind: FailureKind::Network,
            message: "Could not fetch run list. Unable to reach 'http://localhost/all_runs' \
                      Cause: connection refused"
                .to_string(),
            status: None,
        }
    }

    fn sample(colony_id: u32) -> PosteriorSamplePoint {
        PosteriorSamplePoint {
            colony_id,
            nest_quality_assessment_error: 0.1,
            percentage_foragers: 25.0,
            number_nests: 3,
            exploring_phase: 10,
        }
    }

    fn run_state(id: u64) -> AppState {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::OpenRunView {
                run: run(id, Some(RunState::Running)),
            },
        )
        .unwrap();
        state
    }

    fn run_view(state: &AppState) -> &RunView {
        state.run_view().expect("run view")
    }

    #[test]
    fn open_and_close_run_view() {
        let mut state = run_state(7);
        assert_eq!(run_view(&state).run_id(), Some(RunId(7)));

        assert_eq!(
            reduce(&mut state, Action::CloseRunView),
            Ok(Change::Changed)
        );
        assert!(state.home().is_some());
        assert_eq!(
            reduce(&mut state, Action::CloseRunView),
            Err(ReduceError::WrongView {
                action: "close_run_view",
                view: "home",
            })
        );
    }

    #[test]
    fn run_view_actions_fail_fast_on_home() {
        let mut state = AppState::default();
        let err = reduce(
            &mut state,
            Action::AppendLogs {
                logs: logs(&[("build", 1.0, "a")]),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReduceError::WrongView { view: "home", .. }));

        let err = reduce(
            &mut state,
            Action::SetNotification {
                scope: Scope::Output,
                notification: Notification::plain("x"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReduceError::WrongView { .. }));
    }

    #[test]
    fn repeated_set_logs_is_a_no_op() {
        let mut state = run_state(7);
        let batch = logs(&[("build", 10.0, "ok")]);

        assert_eq!(
            reduce(&mut state, Action::SetLogs { logs: batch.clone() }),
            Ok(Change::Changed)
        );
        let before = run_view(&state).logs.logs.as_ref().unwrap().context("build").as_ptr();
        assert_eq!(
            reduce(&mut state, Action::SetLogs { logs: batch }),
            Ok(Change::Unchanged)
        );
        let after = run_view(&state).logs.logs.as_ref().unwrap().context("build").as_ptr();
        assert_eq!(before, after);
    }

    #[test]
    fn append_logs_merges_and_empty_batch_is_a_no_op() {
        let mut state = run_state(7);
        reduce(
            &mut state,
            Action::AppendLogs {
                logs: logs(&[("build", 10.0, "ok")]),
            },
        )
        .unwrap();
        reduce(
            &mut state,
            Action::AppendLogs {
                logs: logs(&[("build", 11.0, "more"), ("run", 12.0, "go")]),
            },
        )
        .unwrap();

        let held = run_view(&state).logs.logs.as_ref().unwrap();
        assert_eq!(held.context("build").len(), 2);
        assert_eq!(held.last_timestamp().timestamp(), 12);

        let snapshot = state.clone();
        assert_eq!(
            reduce(
                &mut state,
                Action::AppendLogs {
                    logs: LogCollection::new()
                }
            ),
            Ok(Change::Unchanged)
        );
        assert_eq!(state, snapshot);
    }

    #[test]
    fn empty_logs_before_any_data_show_waiting_message() {
        let mut state = run_state(7);
        assert_eq!(
            reduce(
                &mut state,
                Action::AppendLogs {
                    logs: LogCollection::new()
                }
            ),
            Ok(Change::Changed)
        );
        assert_eq!(
            state.notification(Scope::Logs),
            Some(&Notification::plain("Waiting for some logs…"))
        );
        assert_eq!(
            reduce(
                &mut state,
                Action::AppendLogs {
                    logs: LogCollection::new()
                }
            ),
            Ok(Change::Unchanged)
        );
    }

    #[test]
    fn empty_output_waits_and_real_output_clears_notification() {
        let mut state = run_state(7);
        reduce(
            &mut state,
            Action::SetOutput {
                output: String::new(),
            },
        )
        .unwrap();
        assert_eq!(
            state.notification(Scope::Output),
            Some(&Notification::plain("Waiting for some output…"))
        );

        reduce(
            &mut state,
            Action::SetOutput {
                output: "step 1".to_string(),
            },
        )
        .unwrap();
        assert_eq!(run_view(&state).output.output.as_deref(), Some("step 1"));
        assert_eq!(state.notification(Scope::Output), Some(&Notification::None));

        assert_eq!(
            reduce(
                &mut state,
                Action::SetOutput {
                    output: "step 1".to_string()
                }
            ),
            Ok(Change::Unchanged)
        );
        assert_eq!(
            reduce(
                &mut state,
                Action::NoDataYet {
                    kind: DataKind::Output
                }
            ),
            Ok(Change::Unchanged)
        );
    }

    #[test]
    fn results_follow_the_same_waiting_rule() {
        let mut state = run_state(7);
        reduce(&mut state, Action::SetResults { results: vec![] }).unwrap();
        assert_eq!(
            state.notification(Scope::Results),
            Some(&Notification::plain("Waiting for some results…"))
        );

        reduce(
            &mut state,
            Action::SetResults {
                results: vec![sample(0), sample(1)],
            },
        )
        .unwrap();
        assert_eq!(run_view(&state).results.results.as_ref().unwrap().len(), 2);
        assert_eq!(state.notification(Scope::Results), Some(&Notification::None));
    }

    #[test]
    fn set_run_never_leaves_a_terminal_state() {
        let mut state = run_state(7);
        assert_eq!(
            reduce(
                &mut state,
                Action::SetRun {
                    run: run(7, Some(RunState::Finished))
                }
            ),
            Ok(Change::Changed)
        );
        assert_eq!(
            reduce(
                &mut state,
                Action::SetRun {
                    run: run(7, Some(RunState::Running))
                }
            ),
            Ok(Change::Unchanged)
        );
        assert_eq!(run_view(&state).run.state, Some(RunState::Finished));
    }

    #[test]
    fn set_run_for_another_run_is_rejected() {
        let mut state = run_state(7);
        let err = reduce(
            &mut state,
            Action::SetRun {
                run: run(8, Some(RunState::Running)),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReduceError::RunMismatch { .. }));
    }

    #[test]
    fn identical_notification_is_suppressed() {
        let mut state = AppState::default();
        let action = Action::SetNotification {
            scope: Scope::RunList,
            notification: Notification::loading("Loading runs…"),
        };
        assert_eq!(reduce(&mut state, action.clone()), Ok(Change::Changed));
        assert_eq!(reduce(&mut state, action), Ok(Change::Unchanged));
    }

    #[test]
    fn run_list_error_keeps_stale_list() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::SetRunList {
                runs: vec![run(1, Some(RunState::Finished))],
            },
        )
        .unwrap();
        reduce(
            &mut state,
            Action::SetNotification {
                scope: Scope::RunList,
                notification: Notification::DomainError(network_failure()),
            },
        )
        .unwrap();

        let home = state.home().unwrap();
        assert_eq!(home.run_list.runs.as_ref().unwrap().len(), 1);
        assert_eq!(
            home.run_list.notification.get(),
            &Notification::DomainError(network_failure())
        );

        // The next good fetch clears the error even when the list is unchanged.
        assert_eq!(
            reduce(
                &mut state,
                Action::SetRunList {
                    runs: vec![run(1, Some(RunState::Finished))]
                }
            ),
            Ok(Change::Changed)
        );
        assert_eq!(state.notification(Scope::RunList), Some(&Notification::None));
    }

    #[test]
    fn selecting_a_branch_resets_commit_choice() {
        let mut state = AppState::default();
        let commit = Commit {
            hash: "abc123".to_string(),
            authored_at: Utc.with_ymd_and_hms(2023, 5, 1, 9, 0, 0).unwrap(),
            author: "Ada".to_string(),
            message: "Calibrate".to_string(),
        };
        for action in [
            Action::OpenSetup,
            Action::SelectBranch {
                branch: Some(Branch::new("main")),
            },
            Action::SetCommitList {
                commits: vec![commit.clone()],
            },
            Action::SelectCommit {
                commit: Some(commit),
            },
        ] {
            reduce(&mut state, action).unwrap();
        }
        assert!(state.home().unwrap().setup.commit.is_some());

        reduce(
            &mut state,
            Action::SelectBranch {
                branch: Some(Branch::new("calibration")),
            },
        )
        .unwrap();
        let setup = &state.home().unwrap().setup;
        assert_eq!(setup.commits, None);
        assert_eq!(setup.commit, None);
    }

    #[test]
    fn confirm_launch_requires_branch_and_commit() {
        let mut state = AppState::default();
        reduce(&mut state, Action::OpenSetup).unwrap();
        assert_eq!(
            reduce(&mut state, Action::ConfirmLaunch),
            Err(ReduceError::IncompleteLaunch { missing: "branch" })
        );
        reduce(
            &mut state,
            Action::SelectBranch {
                branch: Some(Branch::new("main")),
            },
        )
        .unwrap();
        assert_eq!(
            reduce(&mut state, Action::ConfirmLaunch),
            Err(ReduceError::IncompleteLaunch { missing: "commit" })
        );
    }

    #[test]
    fn confirm_launch_gives_the_same_state_every_time() {
        let mut state = AppState::default();
        for action in [
            Action::OpenSetup,
            Action::SelectBranch {
                branch: Some(Branch::new("main")),
            },
            Action::SelectCommit {
                commit: Some(Commit {
                    hash: "abc123".to_string(),
                    authored_at: Utc.with_ymd_and_hms(2023, 5, 1, 9, 0, 0).unwrap(),
                    author: "Ada".to_string(),
                    message: "Calibrate".to_string(),
                }),
            },
        ] {
            reduce(&mut state, action).unwrap();
        }

        let mut first = state.clone();
        let mut second = state;
        assert_eq!(reduce(&mut first, Action::ConfirmLaunch), Ok(Change::Changed));
        assert_eq!(reduce(&mut second, Action::ConfirmLaunch), Ok(Change::Changed));
        assert_eq!(first, second);
        assert!(first.home().unwrap().setup.is_open);
    }

    #[test]
    fn successful_launch_prepends_run_and_closes_form() {
        let mut state = AppState::default();
        let commit = Commit {
            hash: "abc123".to_string(),
            authored_at: Utc.with_ymd_and_hms(2023, 5, 1, 9, 0, 0).unwrap(),
            author: "Ada".to_string(),
            message: "Calibrate".to_string(),
        };
        for action in [
            Action::SetRunList {
                runs: vec![run(41, Some(RunState::Finished))],
            },
            Action::OpenSetup,
            Action::SelectBranch {
                branch: Some(Branch::new("main")),
            },
            Action::SelectCommit {
                commit: Some(commit),
            },
            Action::SetScript {
                value: "sim.oms".to_string(),
            },
            Action::ConfirmLaunch,
        ] {
            reduce(&mut state, action).unwrap();
        }
        assert_eq!(
            state.notification(Scope::RunList),
            Some(&Notification::LaunchInitiated)
        );

        let draft = state
            .home()
            .unwrap()
            .setup
            .draft(Utc.with_ymd_and_hms(2023, 5, 3, 12, 0, 0).unwrap())
            .unwrap();
        assert_eq!(draft.id, None);
        assert_eq!(draft.code.commit_hash, "abc123");
        assert_eq!(draft.code.branch, "main");
        assert_eq!(draft.job_dir, "openmole");
        assert_eq!(draft.output_dir, "output");
        assert_eq!(draft.script, "sim.oms");

        let persisted = Run {
            id: Some(RunId(42)),
            state: Some(RunState::Running),
            ..draft
        };
        reduce(
            &mut state,
            Action::LaunchSucceeded {
                run: persisted.clone(),
            },
        )
        .unwrap();

        let home = state.home().unwrap();
        let runs = home.run_list.runs.as_ref().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, Some(RunId(42)));
        assert!(!home.setup.is_open);
        assert_eq!(
            home.run_list.notification.get(),
            &Notification::LaunchSucceeded(persisted.clone())
        );

        // A replayed success does not duplicate the entry.
        assert_eq!(
            reduce(&mut state, Action::LaunchSucceeded { run: persisted }),
            Ok(Change::Unchanged)
        );
    }

    #[test]
    fn failed_launch_keeps_form_open() {
        let mut state = AppState::default();
        reduce(&mut state, Action::OpenSetup).unwrap();
        reduce(
            &mut state,
            Action::LaunchFailed {
                error: network_failure(),
            },
        )
        .unwrap();
        let home = state.home().unwrap();
        assert!(home.setup.is_open);
        assert!(matches!(
            home.run_list.notification.get(),
            Notification::LaunchFailed(_)
        ));
    }

    #[test]
    fn app_revision_counts_effective_changes() {
        let mut app = RunMonitorApp::default();
        app.apply(Action::OpenSetup).unwrap();
        app.apply(Action::OpenSetup).unwrap();
        assert_eq!(app.revision(), 1);
    }
}
