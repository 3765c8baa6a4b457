use runmon_core::{FailureReport, Run};
use serde::{Deserialize, Serialize};

/// Message held by a view. Each view holds at most one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Notification {
    #[default]
    None,
    Loading(String),
    LaunchInitiated,
    LaunchSucceeded(Run),
    LaunchFailed(FailureReport),
    PlainMessage(String),
    DomainError(FailureReport),
}

impl Notification {
    pub fn is_none(&self) -> bool {
        matches!(self, Notification::None)
    }

    pub fn plain(message: impl Into<String>) -> Self {
        Notification::PlainMessage(message.into())
    }

    pub fn loading(message: impl Into<String>) -> Self {
        Notification::Loading(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Info,
    Success,
    Danger,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Danger => "danger",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display text and severity of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNotification {
    pub text: String,
    pub severity: Severity,
}

impl ResolvedNotification {
    pub fn is_empty(&self) -> bool {
        self.severity == Severity::None && self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runmon_core::FailureKind;

    #[test]
    fn default_notification_is_none() {
        assert!(Notification::default().is_none());
        assert!(!Notification::plain("x").is_none());
    }

    #[test]
    fn notification_serializes_with_kind_tag() {
        let encoded = serde_json::to_value(Notification::loading("Loading runs")).unwrap();
        assert_eq!(encoded["kind"], "loading");
        assert_eq!(encoded["payload"], "Loading runs");

        let encoded = serde_json::to_value(Notification::LaunchInitiated).unwrap();
        assert_eq!(encoded["kind"], "launch_initiated");
    }

    #[test]
    fn notifications_compare_by_value() {
        let report = FailureReport {
            kind: FailureKind::Network,
            message: "down".to_string(),
            status: None,
        };
        assert_eq!(
            Notification::DomainError(report.clone()),
            Notification::DomainError(report.clone())
        );
        assert_ne!(
            Notification::DomainError(report.clone()),
            Notification::LaunchFailed(report)
        );
    }
}
