use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use runmon_core::{
    load_config_or_default, ClientConfig, Validate, ValidationIssue, ValidationLevel,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/runmon.toml";

#[derive(Debug, Parser)]
#[command(name = "runmon")]
#[command(about = "Monitor and launch remote simulation runs")]
pub struct Cli {
    /// Client configuration file; missing means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
    /// Overrides `[backend] base_url`.
    #[arg(long, global = true)]
    pub backend_url: Option<String>,
    /// Overrides `[source] api_url`.
    #[arg(long, global = true)]
    pub source_url: Option<String>,
    /// Print lists as JSON.
    #[arg(long, global = true)]
    pub json: bool,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every run known to the backend
    Runs,
    /// List branches of the simulation repository
    Branches,
    /// List commits of a branch
    Commits { branch: String },
    /// Launch a run from a branch and commit
    Launch(LaunchArgs),
    /// Follow a run until it settles
    Watch { run_id: u64 },
}

#[derive(Debug, Args)]
pub struct LaunchArgs {
    #[arg(long)]
    pub branch: String,
    /// Full hash or unambiguous prefix.
    #[arg(long)]
    pub commit: String,
    #[arg(long)]
    pub job_dir: Option<String>,
    #[arg(long)]
    pub output_dir: Option<String>,
    #[arg(long)]
    pub script: Option<String>,
    /// Keep following the run once it is launched.
    #[arg(long)]
    pub watch: bool,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "runmon=debug"
        } else {
            "runmon=info"
        }
    }

    /// Load the file, apply flag overrides and refuse invalid settings.
    pub fn resolve_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = load_client_config(&self.config)?;
        if let Some(url) = &self.backend_url {
            config.backend.base_url = url.trim().to_string();
        }
        if let Some(url) = &self.source_url {
            config.source.api_url = url.trim().to_string();
        }
        check_config(&config.validate())?;
        Ok(config)
    }
}

fn load_client_config(path: &Path) -> anyhow::Result<ClientConfig> {
    load_config_or_default(path)
        .with_context(|| format!("failed to load client config at {}", path.display()))
}

fn check_config(issues: &[ValidationIssue]) -> anyhow::Result<()> {
    for issue in issues
        .iter()
        .filter(|issue| issue.level == ValidationLevel::Warning)
    {
        tracing::warn!(code = issue.code, "{}", issue.message);
    }

    let errors = issues
        .iter()
        .filter(|issue| issue.level == ValidationLevel::Error)
        .map(|issue| format!("{}: {}", issue.code, issue.message))
        .collect::<Vec<_>>();
    if errors.is_empty() {
        return Ok(());
    }
    bail!("client config validation failed ({})", errors.join("; "))
}
