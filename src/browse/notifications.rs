//! Transient user-facing notifications
//!
//! The session appends a notification whenever an operation fails (or a
//! host-visible action succeeds). The list is owned by whoever displays it:
//! the host calls [`Notifications::expire`] periodically to drop entries that
//! have been visible for longer than the visibility plus animation window.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Success,
}

/// A single message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    /// Detail from the failing collaborator, when there is one
    pub extra: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether the message should be fading out at `now`
    #[must_use]
    pub fn should_hide(&self, now: DateTime<Utc>, visibility: Duration) -> bool {
        now - self.created_at > visibility
    }
}

/// Timing and size limits for the notification list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    pub capacity: usize,
    pub visibility: Duration,
    pub animation: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            capacity: 32,
            visibility: Duration::seconds(10),
            animation: Duration::seconds(2),
        }
    }
}

/// Bounded list of notifications, newest first
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    config: NotificationConfig,
    items: VecDeque<Notification>,
    next_id: u64,
}

impl Notifications {
    #[must_use]
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            items: VecDeque::new(),
            next_id: 0,
        }
    }

    pub fn push_error(&mut self, message: impl Into<String>, extra: Option<String>) -> &Notification {
        self.push(NotificationKind::Error, message.into(), extra, Utc::now())
    }

    pub fn push_success(&mut self, message: impl Into<String>) -> &Notification {
        self.push(NotificationKind::Success, message.into(), None, Utc::now())
    }

    /// Append with an explicit timestamp
    pub fn push(
        &mut self,
        kind: NotificationKind,
        message: String,
        extra: Option<String>,
        created_at: DateTime<Utc>,
    ) -> &Notification {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push_front(Notification {
            id,
            kind,
            message,
            extra,
            created_at,
        });
        self.items.truncate(self.config.capacity.max(1));
        &self.items[0]
    }

    /// Drop notifications whose visibility and animation have both elapsed
    pub fn expire(&mut self, now: DateTime<Utc>) {
        let lifetime = self.config.visibility + self.config.animation;
        self.items.retain(|n| now - n.created_at < lifetime);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn config(&self) -> &NotificationConfig {
        &self.config
    }
}
