use serde::{Deserialize, Serialize};

use crate::types::Notification;

/// Single notification held by one view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationSlot(Notification);

impl NotificationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> &Notification {
        &self.0
    }

    /// Replace the held notification. Returns false when `next` equals the
    /// current one, in which case nothing is written.
    pub fn set(&mut self, next: Notification) -> bool {
        if self.0 == next {
            return false;
        }
        self.0 = next;
        true
    }

    pub fn clear(&mut self) -> bool {
        self.set(Notification::None)
    }
}

impl From<Notification> for NotificationSlot {
    fn from(value: Notification) -> Self {
        Self(value)
    }
}
