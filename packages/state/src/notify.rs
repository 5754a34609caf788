//! Toast-style notifications emitted by the stores.
//!
//! The stores never render anything; they hand a [`Notification`] to whatever
//! [`Notifier`] the host injected. [`TracingNotifier`] writes them to the log,
//! [`ActivityLog`] keeps them for a log panel (and for tests).

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::services::{Clock, SystemClock};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    #[default]
    Default,
    Destructive,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.variant == Variant::Destructive
    }
}

/// Fire-and-forget presentation of notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.variant {
            Variant::Default => tracing::info!(title = %n.title, "{}", n.description),
            Variant::Destructive => tracing::warn!(title = %n.title, "{}", n.description),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub notification: Notification,
}

/// Collects notifications in arrival order. Clones share the same log.
#[derive(Clone)]
pub struct ActivityLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    clock: Arc<dyn Clock>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityLog")
            .field("entries", &self.lock().len())
            .finish_non_exhaustive()
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log whose entries are stamped by `clock`.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            entries: Arc::default(),
            clock: Arc::new(clock),
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().iter().map(|e| e.notification.clone()).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.lock().last().map(|e| e.notification.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for ActivityLog {
    fn notify(&self, notification: Notification) {
        self.lock().push(LogEntry {
            timestamp: self.clock.now(),
            notification,
        });
    }
}
