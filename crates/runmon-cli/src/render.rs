//! Plain-text rendering of lists and of a followed run.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use runmon_core::timestamp::format_timestamp;
use runmon_core::{group_by_colony, Branch, Commit, LogEntry, Run, RunId, RunState};
use runmon_notify::{resolve, NotificationSink, ResolvedNotification};
use runmon_ui::{AppState, Scope};

pub fn run_row(run: &Run) -> String {
    let id = run
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let state = run.state.map_or("pending", RunState::as_str);
    format!(
        "{id:>5}  {state:<8}  {}  {}  {}  {}",
        format_timestamp(&run.launched_at),
        run.short_hash(),
        run.code.branch,
        run.code.description
    )
}

pub fn branch_row(branch: &Branch) -> String {
    branch.name.clone()
}

pub fn commit_row(commit: &Commit) -> String {
    let subject = commit.message.lines().next().unwrap_or_default();
    format!(
        "{}  {}  {}  {subject}",
        commit.short_hash(),
        format_timestamp(&commit.authored_at),
        commit.author
    )
}

fn log_lines(context: &str, entry: &LogEntry) -> Vec<String> {
    let at = format_timestamp(&entry.timestamp);
    let stdout = entry
        .stdout
        .lines()
        .map(|line| format!("{at} [{context}] {line}"));
    let stderr = entry
        .stderr
        .lines()
        .map(|line| format!("{at} [{context}!] {line}"));
    stdout.chain(stderr).collect()
}

#[derive(Debug, Default)]
struct PrintedContext {
    entries: usize,
    last: Option<LogEntry>,
}

/// Prints what changed in the run view since the previous call.
pub struct WatchPrinter<W, S> {
    out: W,
    sink: S,
    run: Option<RunId>,
    state: Option<RunState>,
    printed_logs: HashMap<String, PrintedContext>,
    output: Option<String>,
    result_rows: Option<usize>,
    notifications: BTreeMap<&'static str, ResolvedNotification>,
}

impl<W: Write, S: NotificationSink> WatchPrinter<W, S> {
    pub fn new(out: W, sink: S) -> Self {
        Self {
            out,
            sink,
            run: None,
            state: None,
            printed_logs: HashMap::new(),
            output: None,
            result_rows: None,
            notifications: BTreeMap::new(),
        }
    }

    pub fn into_parts(self) -> (W, S) {
        (self.out, self.sink)
    }

    pub fn render(&mut self, state: &AppState) -> anyhow::Result<()> {
        self.render_notifications(state)?;
        let Some(view) = state.run_view() else {
            return Ok(());
        };

        if self.run != view.run.id {
            self.run = view.run.id;
            self.state = None;
            self.printed_logs.clear();
            self.output = None;
            self.result_rows = None;
        }

        if self.state != view.run.state {
            self.state = view.run.state;
            writeln!(self.out, "{}", run_row(&view.run))?;
        }

        if let Some(logs) = &view.logs.logs {
            for context in logs.contexts() {
                let entries = logs.context(context);
                let printed = self.printed_logs.entry(context.to_string()).or_default();
                for entry in &entries[printed.entries.min(entries.len())..] {
                    // The watermark entry comes back on every fetch of a quiet run.
                    if printed.last.as_ref() == Some(entry) {
                        continue;
                    }
                    for line in log_lines(context, entry) {
                        writeln!(self.out, "{line}")?;
                    }
                    printed.last = Some(entry.clone());
                }
                printed.entries = entries.len();
            }
        }

        if let Some(output) = &view.output.output {
            if self.output.as_ref() != Some(output) {
                writeln!(self.out, "--- output ---")?;
                writeln!(self.out, "{}", output.trim_end())?;
                self.output = Some(output.clone());
            }
        }

        if let Some(results) = &view.results.results {
            if self.result_rows != Some(results.len()) {
                writeln!(
                    self.out,
                    "results: {} rows across {} colonies",
                    results.len(),
                    group_by_colony(results).len()
                )?;
                self.result_rows = Some(results.len());
            }
        }
        Ok(())
    }

    fn render_notifications(&mut self, state: &AppState) -> anyhow::Result<()> {
        for scope in Scope::all() {
            let Some(notification) = state.notification(scope) else {
                continue;
            };
            let resolved = resolve(notification);
            if self.notifications.get(scope.as_str()) == Some(&resolved) {
                continue;
            }
            self.sink.show(scope.as_str(), &resolved)?;
            self.notifications.insert(scope.as_str(), resolved);
        }
        Ok(())
    }
}
