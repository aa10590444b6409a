use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use uuid::Uuid;

use crate::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub severity: Severity,
    pub message: String,
    pub expires_at: Instant,
}

/// Non-blocking toast queue shared by every controller on a page.
///
/// Pushing never waits for the user; entries disappear on their own once
/// their deadline passes, or earlier through [`Notifications::dismiss`].
#[derive(Debug)]
pub struct Notifications {
    ttl: Duration,
    queue: Mutex<VecDeque<Notification>>,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Queues a notification and logs it; nothing shown to the user goes
    /// unlogged.
    pub fn push(&self, severity: Severity, message: impl Into<String>) -> Uuid {
        let message = message.into();
        match severity {
            Severity::Error => warn!(notification = %message, "user notified of failure"),
            Severity::Success | Severity::Info => info!(notification = %message, "user notified"),
        }

        let id = Uuid::new_v4();
        lock(&self.queue).push_back(Notification {
            id,
            severity,
            message,
            expires_at: Instant::now() + self.ttl,
        });
        id
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(Severity::Success, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(Severity::Info, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(Severity::Error, message)
    }

    /// Returns whether the notification was still queued.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut queue = lock(&self.queue);
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() != before
    }

    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }

    /// Prunes everything expired as of `now` and returns the rest, oldest
    /// first.
    pub fn active_at(&self, now: Instant) -> Vec<Notification> {
        let mut queue = lock(&self.queue);
        queue.retain(|n| n.expires_at > now);
        queue.iter().cloned().collect()
    }

    /// Empties the queue, expired entries included.
    pub fn drain(&self) -> Vec<Notification> {
        lock(&self.queue).drain(..).collect()
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
