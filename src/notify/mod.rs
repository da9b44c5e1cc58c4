pub mod toast;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Success => "✅",
            Severity::Error => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            severity,
            message: message.into(),
            issued_at,
        }
    }

    pub fn success(message: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self::new(Severity::Success, message, issued_at)
    }

    pub fn error(message: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self::new(Severity::Error, message, issued_at)
    }

    /// Text as shown to the user, icon first.
    pub fn display_text(&self) -> String {
        format!("{} {}", self.severity.icon(), self.message)
    }
}

/// The user-visible toast channel.
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

#[derive(Debug, Error)]
#[error("clipboard write failed: {0}")]
pub struct ClipboardError(pub String);

/// Write-only system clipboard.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}
