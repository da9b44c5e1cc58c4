use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::notify::{Notification, NotificationSink};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub notification: Notification,
}

/// Stacked, auto-dismissing toasts. Newest last.
#[derive(Debug, Clone)]
pub struct ToastStack {
    toasts: Vec<Toast>,
    next_id: u64,
    duration: Duration,
    history: Vec<Notification>,
}

impl Default for ToastStack {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl ToastStack {
    pub fn new(duration: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 1,
            duration,
            history: Vec::new(),
        }
    }

    pub fn push(&mut self, notification: Notification) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.history.push(notification.clone());
        self.toasts.push(Toast { id, notification });
        id
    }

    /// Drop every toast whose display time has run out.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = TimeDelta::from_std(self.duration).unwrap_or(TimeDelta::zero());
        let before = self.toasts.len();
        self.toasts
            .retain(|t| now.signed_duration_since(t.notification.issued_at) < ttl);
        before - self.toasts.len()
    }

    /// Manual dismissal (click on the toast).
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        before != self.toasts.len()
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    /// Every notification ever pushed, including expired ones.
    pub fn history(&self) -> &[Notification] {
        &self.history
    }
}

impl NotificationSink for ToastStack {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}
