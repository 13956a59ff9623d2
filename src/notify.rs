//! Transient operator messages; a newer one replaces the visible one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::config::DEFAULT_NOTIFY_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
    pub shown_at: DateTime<Utc>,
}

/// Capability handed to every view; views never look the channel up themselves.
pub trait Notifier: Send + Sync {
    /// `duration` of `None` uses the notifier's default.
    fn show(&self, message: String, severity: Severity, duration: Option<Duration>);

    fn success(&self, message: &str) {
        self.show(message.to_string(), Severity::Success, None);
    }

    fn warning(&self, message: &str) {
        self.show(message.to_string(), Severity::Warning, None);
    }

    fn error(&self, message: &str) {
        self.show(message.to_string(), Severity::Error, None);
    }
}

pub struct NotificationChannel {
    slot: Arc<watch::Sender<Option<Notification>>>,
    default_duration: Duration,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_NOTIFY_MS))
    }
}

impl NotificationChannel {
    pub fn new(default_duration: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
            default_duration,
        }
    }

    pub fn current(&self) -> Option<Notification> {
        self.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.slot.subscribe()
    }

    /// Operator closed the message before it timed out.
    pub fn dismiss(&self) {
        self.slot.send_replace(None);
    }

    fn expire(slot: &watch::Sender<Option<Notification>>, id: Uuid) -> bool {
        slot.send_if_modified(|current| match current {
            Some(n) if n.id == id => {
                *current = None;
                true
            }
            _ => false,
        })
    }
}

impl Notifier for NotificationChannel {
    fn show(&self, message: String, severity: Severity, duration: Option<Duration>) {
        let notification = Notification {
            id: Uuid::new_v4(),
            message,
            severity,
            duration: duration.unwrap_or(self.default_duration),
            shown_at: Utc::now(),
        };
        let id = notification.id;
        let duration = notification.duration;
        debug!("notify [{}] {}", notification.severity, notification.message);

        if let Some(replaced) = self.slot.send_replace(Some(notification)) {
            debug!("replaced notification {}", replaced.id);
        }

        // Without a runtime there is nobody to run the timer; the message stays until dismissed.
        if let Ok(handle) = Handle::try_current() {
            let slot = Arc::clone(&self.slot);
            handle.spawn(async move {
                tokio::time::sleep(duration).await;
                if NotificationChannel::expire(&slot, id) {
                    debug!("notification {} expired", id);
                }
            });
        }
    }
}
