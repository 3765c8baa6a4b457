//! Branch and commit listing from the hosted repository API.

use async_trait::async_trait;
use reqwest::Url;
use runmon_core::{Branch, Commit};

use crate::error::ClientError;
use crate::http::{get_json, join, parse_base};
use crate::port::SourceRepository;
use crate::types::{HostedBranch, HostedCommit};

pub const FETCH_BRANCHES: &str = "Could not fetch branches.";
pub const FETCH_COMMITS: &str = "Could not fetch commits.";

/// Repository API rooted at `.../repos/{owner}/{repo}`.
#[derive(Debug, Clone)]
pub struct HostedRepository {
    api_url: Url,
    http: reqwest::Client,
}

impl HostedRepository {
    pub fn new(api_url: &str, user_agent: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|err| ClientError::InvalidUrl {
                base: api_url.to_string(),
                message: format!("failed to build http client: {err}"),
            })?;
        Self::with_client(api_url, http)
    }

    pub fn with_client(api_url: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        Ok(Self {
            api_url: parse_base(api_url)?,
            http,
        })
    }
}

#[async_trait]
impl SourceRepository for HostedRepository {
    async fn fetch_branches(&self) -> Result<Vec<Branch>, ClientError> {
        let url = join(&self.api_url, &["branches"])?;
        let branches: Vec<HostedBranch> = get_json(&self.http, url, FETCH_BRANCHES).await?;
        Ok(branches.into_iter().map(Branch::from).collect())
    }

    async fn fetch_commits(&self, branch: &str) -> Result<Vec<Commit>, ClientError> {
        let mut url = join(&self.api_url, &["commits"])?;
        url.query_pairs_mut().append_pair("sha", branch);
        let commits: Vec<HostedCommit> = get_json(&self.http, url, FETCH_COMMITS).await?;
        Ok(commits.into_iter().map(Commit::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn branches_are_listed_with_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/branches"))
            .and(header("user-agent", "runmon-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "main", "commit": {"sha": "1"}},
                {"name": "calibration", "commit": {"sha": "2"}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let source =
            HostedRepository::new(&format!("{}/repos/o/r", server.uri()), "runmon-test").unwrap();
        let branches = source.fetch_branches().await.unwrap();
        assert_eq!(branches, vec![Branch::new("main"), Branch::new("calibration")]);
    }

    #[tokio::test]
    async fn commits_are_filtered_by_branch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/commits"))
            .and(query_param("sha", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "sha": "abc123def",
                "commit": {
                    "author": {"name": "Ada", "date": "2023-04-01T10:00:00Z"},
                    "message": "Add nest model"
                }
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let source =
            HostedRepository::new(&format!("{}/repos/o/r", server.uri()), "runmon-test").unwrap();
        let commits = source.fetch_commits("main").await.unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].short_hash(), "abc123d");
        assert_eq!(commits[0].author, "Ada");
    }

    #[tokio::test]
    async fn rate_limit_is_reported_as_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/branches"))
            .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "0"))
            .mount(&server)
            .await;

        let source =
            HostedRepository::new(&format!("{}/repos/o/r", server.uri()), "runmon-test").unwrap();
        let err = source.fetch_branches().await.unwrap_err();
        assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
        assert!(err.to_string().starts_with(FETCH_BRANCHES));
        assert!(err.to_string().contains("x-ratelimit-remaining"));
    }
}
