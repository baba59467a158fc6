//! Notification sinks.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::analytics::Priority;
use crate::traits::NotificationSink;

/// A delivered notification, as recorded by `MemoryNotificationSink`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

/// Writes notifications to the log. High priority goes out at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn deliver(&self, title: &str, message: &str, priority: Priority) {
        match priority {
            Priority::High => tracing::warn!(title, message, "Health notification"),
            Priority::Normal => tracing::info!(title, message, "Health notification"),
        }
    }
}

/// Keeps delivered notifications in memory.
#[derive(Debug, Default)]
pub struct MemoryNotificationSink {
    delivered: Mutex<Vec<Notification>>,
}

impl MemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl NotificationSink for MemoryNotificationSink {
    fn deliver(&self, title: &str, message: &str, priority: Priority) {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(Notification {
                title: title.to_string(),
                message: message.to_string(),
                priority,
            });
        }
    }
}
