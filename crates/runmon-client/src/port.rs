//! Ports the monitoring session talks to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use runmon_core::{Branch, Commit, LogCollection, ResultSet, Run, RunId};

use crate::error::ClientError;

/// Job execution backend.
#[async_trait]
pub trait RunBackend: Send + Sync {
    async fn fetch_all_runs(&self) -> Result<Vec<Run>, ClientError>;

    async fn fetch_run(&self, id: RunId) -> Result<Run, ClientError>;

    /// Submit `draft` and return the persisted run, id assigned.
    async fn launch_run(&self, draft: &Run) -> Result<Run, ClientError>;

    async fn fetch_run_output(&self, id: RunId) -> Result<String, ClientError>;

    async fn fetch_run_results(&self, id: RunId) -> Result<ResultSet, ClientError>;

    /// Entries with a timestamp at or after `since`.
    async fn fetch_new_logs(
        &self,
        id: RunId,
        since: DateTime<Utc>,
    ) -> Result<LogCollection, ClientError>;
}

/// Hosted repository holding the job code.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    async fn fetch_branches(&self) -> Result<Vec<Branch>, ClientError>;

    async fn fetch_commits(&self, branch: &str) -> Result<Vec<Commit>, ClientError>;
}
