//! Response bodies that do not map one-to-one onto domain types.

use chrono::{DateTime, Utc};
use runmon_core::{Branch, Commit, PosteriorSamplePoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBody {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSampleBody {
    pub data: Vec<PosteriorSamplePoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HostedBranch {
    pub name: String,
}

impl From<HostedBranch> for Branch {
    fn from(value: HostedBranch) -> Self {
        Branch::new(value.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HostedCommit {
    pub sha: String,
    pub commit: HostedCommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HostedCommitDetail {
    pub author: HostedAuthor,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HostedAuthor {
    pub name: String,
    #[serde(with = "runmon_core::timestamp")]
    pub date: DateTime<Utc>,
}

impl From<HostedCommit> for Commit {
    fn from(value: HostedCommit) -> Self {
        Commit {
            hash: value.sha,
            authored_at: value.commit.author.date,
            author: value.commit.author.name,
            message: value.commit.message,
        }
    }
}
