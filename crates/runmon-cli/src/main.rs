mod cli;
mod render;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use clap::Parser;
use runmon_client::{HostedRepository, HttpRunBackend, RunBackend, SourceRepository};
use runmon_core::{Branch, ClientConfig, Commit, Run, RunId};
use runmon_notify::{resolve, LineSink, Notification, NotificationSink};
use runmon_sync::{RunUntil, Session};
use runmon_ui::{Action, AppState, Scope};
use tracing::{info, warn};

use crate::cli::{Cli, Command, LaunchArgs};
use crate::render::{branch_row, commit_row, run_row, WatchPrinter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("runmon failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_filter());

    let config = cli.resolve_config()?;
    let backend: Arc<dyn RunBackend> = Arc::new(
        HttpRunBackend::new(&config.backend.base_url).context("invalid backend url")?,
    );
    let source: Arc<dyn SourceRepository> = Arc::new(
        HostedRepository::new(&config.source.api_url, &config.source.user_agent)
            .context("invalid source url")?,
    );

    match cli.command {
        Command::Runs => {
            let runs = backend.fetch_all_runs().await?;
            print_rows(&runs, cli.json, run_row)
        }
        Command::Branches => {
            let branches = source.fetch_branches().await?;
            print_rows(&branches, cli.json, branch_row)
        }
        Command::Commits { branch } => {
            let commits = source.fetch_commits(&branch).await?;
            print_rows(&commits, cli.json, commit_row)
        }
        Command::Launch(args) => launch(&config, backend, source, args).await,
        Command::Watch { run_id } => {
            let run = backend.fetch_run(RunId(run_id)).await?;
            let session = Session::new(&config, backend, source);
            follow(session, run).await
        }
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();
}

fn print_rows<T: serde::Serialize>(
    rows: &[T],
    json: bool,
    row: fn(&T) -> String,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, rows)?;
        writeln!(out)?;
        return Ok(());
    }
    for item in rows {
        writeln!(out, "{}", row(item))?;
    }
    Ok(())
}

/// Pick the commit named by a full hash or an unambiguous prefix.
fn pick_commit(commits: &[Commit], wanted: &str) -> anyhow::Result<Commit> {
    let wanted = wanted.trim();
    if wanted.is_empty() {
        bail!("commit must not be empty");
    }
    let mut matches = commits
        .iter()
        .filter(|commit| commit.hash.starts_with(wanted));
    match (matches.next(), matches.next()) {
        (Some(commit), None) => Ok(commit.clone()),
        (Some(_), Some(_)) => bail!("commit prefix '{wanted}' is ambiguous"),
        (None, _) => bail!("no commit matching '{wanted}' on this branch"),
    }
}

fn launch_form(args: &LaunchArgs, commits: Vec<Commit>, commit: Commit) -> Vec<Action> {
    let mut actions = vec![
        Action::OpenSetup,
        Action::SelectBranch {
            branch: Some(Branch::new(args.branch.trim())),
        },
        Action::SetCommitList { commits },
        Action::SelectCommit {
            commit: Some(commit),
        },
    ];
    if let Some(value) = &args.job_dir {
        actions.push(Action::SetJobDir {
            value: value.clone(),
        });
    }
    if let Some(value) = &args.output_dir {
        actions.push(Action::SetOutputDir {
            value: value.clone(),
        });
    }
    if let Some(value) = &args.script {
        actions.push(Action::SetScript {
            value: value.clone(),
        });
    }
    actions
}

async fn launch(
    config: &ClientConfig,
    backend: Arc<dyn RunBackend>,
    source: Arc<dyn SourceRepository>,
    args: LaunchArgs,
) -> anyhow::Result<()> {
    let commits = source.fetch_commits(args.branch.trim()).await?;
    let commit = pick_commit(&commits, &args.commit)?;

    let mut session = Session::new(config, backend, source);
    for action in launch_form(&args, commits, commit) {
        session.dispatch(action)?;
    }
    let notes = LineSink::new(io::stdout());
    session.launch(Utc::now())?;
    show(&notes, session.state(), Scope::RunList)?;

    let completion = session.next_completion().await?;
    session.apply_completion(completion)?;
    show(&notes, session.state(), Scope::RunList)?;

    let launched = match session.state().notification(Scope::RunList) {
        Some(Notification::LaunchSucceeded(run)) => run.clone(),
        Some(Notification::LaunchFailed(error)) => bail!("launch failed: {error}"),
        other => return Err(anyhow!("launch ended without an answer: {other:?}")),
    };
    println!("{}", run_row(&launched));

    if args.watch {
        follow(session, launched).await?;
    }
    Ok(())
}

fn show(sink: &dyn NotificationSink, state: &AppState, scope: Scope) -> anyhow::Result<()> {
    if let Some(notification) = state.notification(scope) {
        sink.show(scope.as_str(), &resolve(notification))?;
    }
    Ok(())
}

/// Open the run view and print its changes until nothing is left to poll.
async fn follow(mut session: Session, run: Run) -> anyhow::Result<()> {
    info!(run = ?run.id, "following run");
    session.dispatch(Action::OpenRunView { run })?;

    let mut printer = WatchPrinter::new(io::stdout(), LineSink::new(io::stdout()));
    let mut failure = None;
    session
        .run(RunUntil::Settled, ctrl_c(), |state| {
            if failure.is_none() {
                failure = printer.render(state).err();
            }
        })
        .await?;
    match failure {
        Some(err) => Err(err.context("failed to print run updates")),
        None => Ok(()),
    }
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn commit(hash: &str) -> Commit {
        Commit {
            hash: hash.to_string(),
            authored_at: Utc.with_ymd_and_hms(2023, 5, 1, 9, 0, 0).unwrap(),
            author: "Ada".to_string(),
            message: "Calibrate".to_string(),
        }
    }

    fn args() -> LaunchArgs {
        LaunchArgs {
            branch: " main ".to_string(),
            commit: "abc".to_string(),
            job_dir: None,
            output_dir: Some("out".to_string()),
            script: None,
            watch: false,
        }
    }

    #[test]
    fn pick_commit_accepts_unique_prefix() {
        let commits = vec![commit("abc123"), commit("def456")];
        assert_eq!(pick_commit(&commits, "abc").unwrap().hash, "abc123");
        assert_eq!(pick_commit(&commits, "def456").unwrap().hash, "def456");
    }

    #[test]
    fn pick_commit_rejects_ambiguous_or_unknown() {
        let commits = vec![commit("abc123"), commit("abd456")];
        let ambiguous = pick_commit(&commits, "ab").unwrap_err();
        assert!(ambiguous.to_string().contains("ambiguous"));
        let unknown = pick_commit(&commits, "fff").unwrap_err();
        assert!(unknown.to_string().contains("no commit matching 'fff'"));
        assert!(pick_commit(&commits, "  ").is_err());
    }

    #[test]
    fn launch_form_fills_the_setup_tool() {
        let chosen = commit("abc123");
        let mut state = AppState::default();
        for action in launch_form(&args(), vec![chosen.clone()], chosen.clone()) {
            runmon_ui::reduce(&mut state, action).unwrap();
        }

        let setup = &state.home().unwrap().setup;
        assert!(setup.is_open);
        assert_eq!(setup.branch, Some(Branch::new("main")));
        assert_eq!(setup.commit, Some(chosen));
        assert_eq!(setup.output_dir, "out");
        assert_eq!(setup.job_dir, "openmole");

        let draft = setup.launch_draft(Utc::now()).unwrap();
        assert_eq!(draft.code.commit_hash, "abc123");
        assert_eq!(draft.code.branch, "main");
    }
}
