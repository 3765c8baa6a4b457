//! Domain types for runs, the code they execute and what they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::{RunLifecycle, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
}

impl Branch {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    #[serde(with = "crate::timestamp")]
    pub authored_at: DateTime<Utc>,
    pub author: String,
    pub message: String,
}

impl Commit {
    /// Abbreviated hash as shown next to commit and run entries.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }
}

/// One immutable source snapshot a run executes against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub commit_hash: String,
    pub branch: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RunId>,
    pub code: Code,
    #[serde(rename = "timestamp", with = "crate::timestamp")]
    pub launched_at: DateTime<Utc>,
    pub job_dir: String,
    pub output_dir: String,
    pub script: String,
    #[serde(default)]
    pub state: Option<RunState>,
}

impl Run {
    /// Build the client-side draft for a launch request.
    pub fn draft(
        commit: &Commit,
        branch: &Branch,
        job_dir: impl Into<String>,
        output_dir: impl Into<String>,
        script: impl Into<String>,
        launched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            code: Code {
                commit_hash: commit.hash.clone(),
                branch: branch.name.clone(),
                description: commit.message.clone(),
            },
            launched_at,
            job_dir: job_dir.into(),
            output_dir: output_dir.into(),
            script: script.into(),
            state: None,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some_and(RunState::is_active)
    }

    pub fn lifecycle(&self) -> RunLifecycle {
        RunLifecycle::from_parts(self.id.is_some(), self.state)
    }

    pub fn short_hash(&self) -> &str {
        self.code
            .commit_hash
            .get(..7)
            .unwrap_or(&self.code.commit_hash)
    }
}

/// One accepted parameter set of the posterior sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSamplePoint {
    pub colony_id: u32,
    pub nest_quality_assessment_error: f64,
    pub percentage_foragers: f64,
    pub number_nests: u32,
    pub exploring_phase: u32,
}

pub type ResultSet = Vec<PosteriorSamplePoint>;

pub fn group_by_colony(rows: &[PosteriorSamplePoint]) -> BTreeMap<u32, Vec<&PosteriorSamplePoint>> {
    let mut groups: BTreeMap<u32, Vec<&PosteriorSamplePoint>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.colony_id).or_default().push(row);
    }
    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No response was obtained.
    Network,
    /// A response came back with a failure status.
    Http,
    /// A success response whose body did not match the expected shape.
    Decode,
}

/// Comparable summary of a failed remote call, carried by notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl FailureReport {
    pub fn is_not_found(&self) -> bool {
        self.kind == FailureKind::Http && self.status == Some(404)
    }
}

impl std::fmt::Display for FailureReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
