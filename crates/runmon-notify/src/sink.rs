use std::io::Write;
use std::sync::Mutex;

use crate::error::NotifyError;
use crate::types::ResolvedNotification;

/// Destination for notifications as they change.
pub trait NotificationSink: Send + Sync {
    /// `scope` names the view that raised the notification.
    fn show(&self, scope: &str, notification: &ResolvedNotification) -> Result<(), NotifyError>;
}

/// Writes one `[severity] scope: text` line per notification.
#[derive(Debug)]
pub struct LineSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> NotificationSink for LineSink<W> {
    fn show(&self, scope: &str, notification: &ResolvedNotification) -> Result<(), NotifyError> {
        if notification.is_empty() {
            return Ok(());
        }
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(
            out,
            "[{}] {}: {}",
            notification.severity, scope, notification.text
        )
        .map_err(|source| NotifyError::Write {
            scope: scope.to_string(),
            source,
        })
    }
}
