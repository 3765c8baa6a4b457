//! Map notifications to what the user sees.

use crate::types::{Notification, ResolvedNotification, Severity};

pub const LAUNCH_INITIATED_TEXT: &str = "Launching… it may take a few seconds";

pub fn resolve(notification: &Notification) -> ResolvedNotification {
    let (text, severity) = match notification {
        Notification::None => (String::new(), Severity::None),
        Notification::Loading(message) => (message.clone(), Severity::Info),
        Notification::LaunchInitiated => (LAUNCH_INITIATED_TEXT.to_string(), Severity::Info),
        Notification::LaunchSucceeded(run) => {
            let id = run
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            (format!("Successfully launched run {id}"), Severity::Success)
        }
        Notification::LaunchFailed(err) => {
            (format!("Launch failed. Error: {err}"), Severity::Danger)
        }
        Notification::PlainMessage(message) => (message.clone(), Severity::Info),
        Notification::DomainError(err) => (err.message.clone(), Severity::Danger),
    };
    ResolvedNotification { text, severity }
}
