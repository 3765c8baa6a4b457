use chrono::{DateTime, Utc};
use runmon_core::{Branch, Commit, LaunchDefaults, LogCollection, ResultSet, Run, RunId};
use runmon_notify::{Notification, NotificationSlot};
use serde::{Deserialize, Serialize};

use crate::error::ReduceError;

pub const WAITING_FOR_LOGS: &str = "Waiting for some logs…";
pub const WAITING_FOR_OUTPUT: &str = "Waiting for some output…";
pub const WAITING_FOR_RESULTS: &str = "Waiting for some results…";
pub const SELECT_BRANCH_HINT: &str = "Please select a branch";

/// The whole client state. Only the reducer mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub view: View,
    pub launch_defaults: LaunchDefaults,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(LaunchDefaults::default())
    }
}

impl AppState {
    pub fn new(launch_defaults: LaunchDefaults) -> Self {
        Self {
            view: View::Home(HomeView::new(&launch_defaults)),
            launch_defaults,
        }
    }

    pub fn home(&self) -> Option<&HomeView> {
        match &self.view {
            View::Home(home) => Some(home),
            View::Run(_) => None,
        }
    }

    pub fn run_view(&self) -> Option<&RunView> {
        match &self.view {
            View::Run(run_view) => Some(run_view),
            View::Home(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Home(HomeView),
    Run(RunView),
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Home(_) => "home",
            View::Run(_) => "run",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeView {
    pub run_list: RunListView,
    pub setup: RunSetupTool,
}

impl HomeView {
    pub fn new(defaults: &LaunchDefaults) -> Self {
        Self {
            run_list: RunListView::default(),
            setup: RunSetupTool::new(defaults),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunListView {
    /// `None` until the first list arrives.
    pub runs: Option<Vec<Run>>,
    pub notification: NotificationSlot,
}

/// New-run form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSetupTool {
    pub is_open: bool,
    pub branches: Option<Vec<Branch>>,
    pub branch: Option<Branch>,
    pub commits: Option<Vec<Commit>>,
    pub commit: Option<Commit>,
    pub job_dir: String,
    pub output_dir: String,
    pub script: String,
    pub notification: NotificationSlot,
}

impl RunSetupTool {
    pub fn new(defaults: &LaunchDefaults) -> Self {
        Self {
            is_open: false,
            branches: None,
            branch: None,
            commits: None,
            commit: None,
            job_dir: defaults.job_dir.clone(),
            output_dir: defaults.output_dir.clone(),
            script: defaults.script.clone(),
            notification: NotificationSlot::new(),
        }
    }

    /// Shown in place of the commit menu while no branch is chosen.
    pub fn commit_hint(&self) -> Option<&'static str> {
        if self.branch.is_none() && self.notification.get().is_none() {
            Some(SELECT_BRANCH_HINT)
        } else {
            None
        }
    }

    /// The run a confirm would submit, if branch and commit are chosen.
    pub fn draft(&self, launched_at: DateTime<Utc>) -> Option<Run> {
        self.launch_draft(launched_at).ok()
    }

    /// Whether a confirm would be accepted. Branch is checked before commit.
    pub fn launch_ready(&self) -> Result<(), ReduceError> {
        self.selection().map(|_| ())
    }

    pub fn launch_draft(&self, launched_at: DateTime<Utc>) -> Result<Run, ReduceError> {
        let (branch, commit) = self.selection()?;
        Ok(Run::draft(
            commit,
            branch,
            self.job_dir.clone(),
            self.output_dir.clone(),
            self.script.clone(),
            launched_at,
        ))
    }

    fn selection(&self) -> Result<(&Branch, &Commit), ReduceError> {
        let branch = self
            .branch
            .as_ref()
            .ok_or(ReduceError::IncompleteLaunch { missing: "branch" })?;
        let commit = self
            .commit
            .as_ref()
            .ok_or(ReduceError::IncompleteLaunch { missing: "commit" })?;
        Ok((branch, commit))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunView {
    pub run: Run,
    pub notification: NotificationSlot,
    pub logs: LogsView,
    pub output: OutputView,
    pub results: ResultsView,
}

impl RunView {
    pub fn new(run: Run) -> Self {
        Self {
            run,
            notification: NotificationSlot::new(),
            logs: LogsView::default(),
            output: OutputView::default(),
            results: ResultsView::default(),
        }
    }

    pub fn run_id(&self) -> Option<RunId> {
        self.run.id
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogsView {
    pub logs: Option<LogCollection>,
    pub notification: NotificationSlot,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputView {
    pub output: Option<String>,
    pub notification: NotificationSlot,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultsView {
    pub results: Option<ResultSet>,
    pub notification: NotificationSlot,
}

/// Which notification slot an action addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    RunList,
    Setup,
    Run,
    Logs,
    Output,
    Results,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::RunList => "run_list",
            Scope::Setup => "setup",
            Scope::Run => "run",
            Scope::Logs => "logs",
            Scope::Output => "output",
            Scope::Results => "results",
        }
    }

    pub fn all() -> [Scope; 6] {
        [
            Scope::RunList,
            Scope::Setup,
            Scope::Run,
            Scope::Logs,
            Scope::Output,
            Scope::Results,
        ]
    }
}

/// Run data that may arrive later than the run itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Logs,
    Output,
    Results,
}

impl DataKind {
    pub fn scope(self) -> Scope {
        match self {
            DataKind::Logs => Scope::Logs,
            DataKind::Output => Scope::Output,
            DataKind::Results => Scope::Results,
        }
    }

    pub fn waiting_message(self) -> &'static str {
        match self {
            DataKind::Logs => WAITING_FOR_LOGS,
            DataKind::Output => WAITING_FOR_OUTPUT,
            DataKind::Results => WAITING_FOR_RESULTS,
        }
    }
}

impl RunView {
    pub fn has_received(&self, kind: DataKind) -> bool {
        match kind {
            DataKind::Logs => self.logs.logs.is_some(),
            DataKind::Output => self.output.output.is_some(),
            DataKind::Results => self.results.results.is_some(),
        }
    }

    pub fn slot(&self, scope: Scope) -> Option<&NotificationSlot> {
        match scope {
            Scope::Run => Some(&self.notification),
            Scope::Logs => Some(&self.logs.notification),
            Scope::Output => Some(&self.output.notification),
            Scope::Results => Some(&self.results.notification),
            Scope::RunList | Scope::Setup => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, scope: Scope) -> Option<&mut NotificationSlot> {
        match scope {
            Scope::Run => Some(&mut self.notification),
            Scope::Logs => Some(&mut self.logs.notification),
            Scope::Output => Some(&mut self.output.notification),
            Scope::Results => Some(&mut self.results.notification),
            Scope::RunList | Scope::Setup => None,
        }
    }
}

impl HomeView {
    pub fn slot(&self, scope: Scope) -> Option<&NotificationSlot> {
        match scope {
            Scope::RunList => Some(&self.run_list.notification),
            Scope::Setup => Some(&self.setup.notification),
            _ => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, scope: Scope) -> Option<&mut NotificationSlot> {
        match scope {
            Scope::RunList => Some(&mut self.run_list.notification),
            Scope::Setup => Some(&mut self.setup.notification),
            _ => None,
        }
    }
}

impl AppState {
    /// Current notification of `scope`, if that slot is mounted.
    pub fn notification(&self, scope: Scope) -> Option<&Notification> {
        let slot = match &self.view {
            View::Home(home) => home.slot(scope),
            View::Run(run_view) => run_view.slot(scope),
        };
        slot.map(NotificationSlot::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn commit() -> Commit {
        Commit {
            hash: "abc123".to_string(),
            authored_at: Utc.with_ymd_and_hms(2023, 5, 1, 9, 0, 0).unwrap(),
            author: "Ada".to_string(),
            message: "Calibrate".to_string(),
        }
    }

    #[test]
    fn new_state_starts_on_home_with_form_defaults() {
        let state = AppState::default();
        let home = state.home().expect("home view");
        assert!(!home.setup.is_open);
        assert_eq!(home.setup.job_dir, "openmole");
        assert_eq!(home.setup.output_dir, "output");
        assert_eq!(home.setup.script, "Colony_fission_ABC.oms");
        assert_eq!(home.run_list.runs, None);
        assert_eq!(state.view.name(), "home");
    }

    #[test]
    fn commit_hint_shows_until_branch_selected() {
        let mut setup = RunSetupTool::new(&LaunchDefaults::default());
        assert_eq!(setup.commit_hint(), Some("Please select a branch"));

        setup.notification.set(Notification::plain("Loading branches"));
        assert_eq!(setup.commit_hint(), None);

        setup.notification.clear();
        setup.branch = Some(Branch::new("main"));
        assert_eq!(setup.commit_hint(), None);
    }

    #[test]
    fn draft_needs_branch_and_commit() {
        let at = Utc.with_ymd_and_hms(2023, 5, 3, 12, 0, 0).unwrap();
        let mut setup = RunSetupTool::new(&LaunchDefaults::default());
        assert!(setup.draft(at).is_none());

        setup.branch = Some(Branch::new("main"));
        assert!(setup.draft(at).is_none());

        setup.commit = Some(commit());
        setup.script = "sim.oms".to_string();
        let draft = setup.draft(at).expect("draft");
        assert_eq!(draft.id, None);
        assert_eq!(draft.code.commit_hash, "abc123");
        assert_eq!(draft.code.branch, "main");
        assert_eq!(draft.script, "sim.oms");
    }

    #[test]
    fn launch_ready_names_the_first_missing_choice() {
        let mut setup = RunSetupTool::new(&LaunchDefaults::default());
        setup.commit = Some(commit());
        assert_eq!(
            setup.launch_ready(),
            Err(ReduceError::IncompleteLaunch { missing: "branch" })
        );

        setup.commit = None;
        setup.branch = Some(Branch::new("main"));
        assert_eq!(
            setup.launch_ready(),
            Err(ReduceError::IncompleteLaunch { missing: "commit" })
        );

        setup.commit = Some(commit());
        assert_eq!(setup.launch_ready(), Ok(()));
    }

    #[test]
    fn notification_lookup_follows_mounted_view() {
        let state = AppState::default();
        assert_eq!(state.notification(Scope::RunList), Some(&Notification::None));
        assert_eq!(state.notification(Scope::Logs), None);
    }
}
