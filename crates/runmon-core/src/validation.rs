//! Validation for client configuration.

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;

const MIN_SENSIBLE_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: ValidationLevel,
    pub code: &'static str,
    pub message: String,
}

pub trait Validate {
    fn validate(&self) -> Vec<ValidationIssue>;
}

impl Validate for ClientConfig {
    fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if !is_http_url(&self.backend.base_url) {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "backend.base_url.invalid",
                message: format!(
                    "backend base_url '{}' must start with http:// or https://",
                    self.backend.base_url
                ),
            });
        }

        if !is_http_url(&self.source.api_url) {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "source.api_url.invalid",
                message: format!(
                    "source api_url '{}' must start with http:// or https://",
                    self.source.api_url
                ),
            });
        }

        if self.source.user_agent.trim().is_empty() {
            issues.push(ValidationIssue {
                level: ValidationLevel::Warning,
                code: "source.user_agent.empty",
                message: "hosted repository APIs usually reject requests without a user agent"
                    .to_string(),
            });
        }

        for (name, value) in self.polling.entries() {
            if value == 0 {
                issues.push(ValidationIssue {
                    level: ValidationLevel::Error,
                    code: zero_interval_code(name),
                    message: format!("polling.{name} cannot be 0"),
                });
            } else if value < MIN_SENSIBLE_INTERVAL_MS {
                issues.push(ValidationIssue {
                    level: ValidationLevel::Warning,
                    code: "polling.interval.low",
                    message: format!(
                        "polling.{name} = {value}ms is below {MIN_SENSIBLE_INTERVAL_MS}ms and will hammer the backend"
                    ),
                });
            }
        }

        for (name, value) in [
            ("job_dir", &self.launch.job_dir),
            ("output_dir", &self.launch.output_dir),
            ("script", &self.launch.script),
        ] {
            if value.trim().is_empty() {
                issues.push(ValidationIssue {
                    level: ValidationLevel::Warning,
                    code: "launch.default.empty",
                    message: format!("launch.{name} is empty; every launch must fill it in"),
                });
            }
        }

        issues
    }
}

fn is_http_url(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.starts_with("http://") || trimmed.starts_with("https://")
}

fn zero_interval_code(name: &str) -> &'static str {
    match name {
        "run_state_ms" => "polling.run_state_ms.zero",
        "run_list_ms" => "polling.run_list_ms.zero",
        "logs_ms" => "polling.logs_ms.zero",
        "output_ms" => "polling.output_ms.zero",
        "results_ms" => "polling.results_ms.zero",
        "branches_ms" => "polling.branches_ms.zero",
        _ => "polling.commits_ms.zero",
    }
}
