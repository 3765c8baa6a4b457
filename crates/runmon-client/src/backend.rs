//! HTTP client for the job execution backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use runmon_core::timestamp::format_timestamp;
use runmon_core::{LogCollection, ResultSet, Run, RunId};
use tracing::debug;

use crate::error::ClientError;
use crate::http::{get_json, join, parse_base};
use crate::port::RunBackend;
use crate::types::{OutputBody, PosteriorSampleBody};

pub const FETCH_RUN_LIST: &str = "Could not fetch run list.";
pub const FETCH_RUN: &str = "Could not fetch run.";
pub const LAUNCH_RUN: &str = "Could not launch run.";
pub const FETCH_LOGS: &str = "Could not fetch logs.";
pub const FETCH_OUTPUT: &str = "Could not fetch run output.";
pub const FETCH_RESULTS: &str = "Could not fetch posterior sample.";

#[derive(Debug, Clone)]
pub struct HttpRunBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpRunBackend {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: parse_base(base_url)?,
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn run_endpoint(&self, resource: &str, id: RunId) -> Result<Url, ClientError> {
        join(&self.base_url, &[resource, &id.to_string()])
    }

    fn launch_url(&self, draft: &Run) -> Result<Url, ClientError> {
        let mut url = join(&self.base_url, &["launch", &draft.code.commit_hash])?;
        url.query_pairs_mut()
            .append_pair("branch", &draft.code.branch)
            .append_pair("description", &draft.code.description)
            .append_pair("timestamp", &format_timestamp(&draft.launched_at))
            .append_pair("job_dir", &draft.job_dir)
            .append_pair("output_dir", &draft.output_dir)
            .append_pair("script", &draft.script);
        Ok(url)
    }
}

#[async_trait]
impl RunBackend for HttpRunBackend {
    async fn fetch_all_runs(&self) -> Result<Vec<Run>, ClientError> {
        let url = join(&self.base_url, &["all_runs"])?;
        get_json(&self.http, url, FETCH_RUN_LIST).await
    }

    async fn fetch_run(&self, id: RunId) -> Result<Run, ClientError> {
        let url = self.run_endpoint("run", id)?;
        get_json(&self.http, url, FETCH_RUN).await
    }

    async fn launch_run(&self, draft: &Run) -> Result<Run, ClientError> {
        let url = self.launch_url(draft)?;
        let run: Run = get_json(&self.http, url, LAUNCH_RUN).await?;
        debug!(id = ?run.id, commit = %draft.short_hash(), "run launched");
        Ok(run)
    }

    async fn fetch_run_output(&self, id: RunId) -> Result<String, ClientError> {
        let url = self.run_endpoint("output", id)?;
        let body: OutputBody = get_json(&self.http, url, FETCH_OUTPUT).await?;
        Ok(body.text)
    }

    async fn fetch_run_results(&self, id: RunId) -> Result<ResultSet, ClientError> {
        let url = self.run_endpoint("posterior_sample", id)?;
        let body: PosteriorSampleBody = get_json(&self.http, url, FETCH_RESULTS).await?;
        Ok(body.data)
    }

    async fn fetch_new_logs(
        &self,
        id: RunId,
        since: DateTime<Utc>,
    ) -> Result<LogCollection, ClientError> {
        let mut url = self.run_endpoint("logs", id)?;
        url.query_pairs_mut()
            .append_pair("from_time", &format_timestamp(&since));
        get_json(&self.http, url, FETCH_LOGS).await
    }
}
