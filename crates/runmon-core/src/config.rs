//! Client configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:80";
pub const DEFAULT_SOURCE_API_URL: &str =
    "https://api.github.com/repos/guillaumecherel/ants-dispersal-strategy";
pub const DEFAULT_JOB_DIR: &str = "openmole";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_SCRIPT: &str = "Colony_fission_ABC.oms";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config at {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
    #[error("failed to create config parent directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config file at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub source: SourceConfig,
    pub polling: PollingConfig,
    pub launch: LaunchDefaults,
}

/// Job execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
        }
    }
}

/// Hosted repository API listing branches and commits of the job code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub api_url: String,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SOURCE_API_URL.to_string(),
            user_agent: format!("runmon/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Poll cadence per resource, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub run_state_ms: u64,
    pub run_list_ms: u64,
    pub logs_ms: u64,
    pub output_ms: u64,
    pub results_ms: u64,
    pub branches_ms: u64,
    pub commits_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            run_state_ms: DEFAULT_POLL_INTERVAL_MS,
            run_list_ms: DEFAULT_POLL_INTERVAL_MS,
            logs_ms: DEFAULT_POLL_INTERVAL_MS,
            output_ms: DEFAULT_POLL_INTERVAL_MS,
            results_ms: DEFAULT_POLL_INTERVAL_MS,
            branches_ms: DEFAULT_POLL_INTERVAL_MS,
            commits_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PollingConfig {
    pub fn entries(&self) -> [(&'static str, u64); 7] {
        [
            ("run_state_ms", self.run_state_ms),
            ("run_list_ms", self.run_list_ms),
            ("logs_ms", self.logs_ms),
            ("output_ms", self.output_ms),
            ("results_ms", self.results_ms),
            ("branches_ms", self.branches_ms),
            ("commits_ms", self.commits_ms),
        ]
    }

    pub fn run_state(&self) -> Duration {
        Duration::from_millis(self.run_state_ms)
    }

    pub fn run_list(&self) -> Duration {
        Duration::from_millis(self.run_list_ms)
    }

    pub fn logs(&self) -> Duration {
        Duration::from_millis(self.logs_ms)
    }

    pub fn output(&self) -> Duration {
        Duration::from_millis(self.output_ms)
    }

    pub fn results(&self) -> Duration {
        Duration::from_millis(self.results_ms)
    }

    pub fn branches(&self) -> Duration {
        Duration::from_millis(self.branches_ms)
    }

    pub fn commits(&self) -> Duration {
        Duration::from_millis(self.commits_ms)
    }
}

/// Values pre-filled in the new-run form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchDefaults {
    pub job_dir: String,
    pub output_dir: String,
    pub script: String,
}

impl Default for LaunchDefaults {
    fn default() -> Self {
        Self {
            job_dir: DEFAULT_JOB_DIR.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            script: DEFAULT_SCRIPT.to_string(),
        }
    }
}

pub fn parse_config(contents: &str) -> Result<ClientConfig, toml::de::Error> {
    toml::from_str(contents)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<ClientConfig, ConfigError> {
    let path_ref = path.as_ref();
    let body = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
        path: path_ref.to_path_buf(),
        source,
    })?;
    parse_config(&body).map_err(|source| ConfigError::Parse {
        path: path_ref.to_path_buf(),
        source,
    })
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<ClientConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Ok(ClientConfig::default())
        }
        other => other,
    }
}

pub fn save_config(path: impl AsRef<Path>, config: &ClientConfig) -> Result<(), ConfigError> {
    let path_ref = path.as_ref();
    if let Some(parent_dir) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent_dir).map_err(|source| ConfigError::CreateDir {
            path: parent_dir.to_path_buf(),
            source,
        })?;
    }

    let body = toml::to_string_pretty(config).map_err(|source| ConfigError::Serialize {
        path: path_ref.to_path_buf(),
        source,
    })?;
    fs::write(path_ref, body).map_err(|source| ConfigError::Write {
        path: path_ref.to_path_buf(),
        source,
    })?;
    Ok(())
}
