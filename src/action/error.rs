use thiserror::Error;

use crate::api::transport::TransportError;
use crate::dom::host::DomError;
use crate::notify::ClipboardError;

/// Why a control's action failed. Every variant maps to exactly one
/// user-facing message through [`ActionKind`].
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("malformed response ({context}): {detail}")]
    Malformed { context: &'static str, detail: String },

    #[error("response is missing '{field}'")]
    MissingField { field: &'static str },

    #[error("nothing to submit")]
    EmptyInput,

    #[error("form control '{0}' not found")]
    MissingControl(&'static str),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl From<TransportError> for ActionError {
    fn from(e: TransportError) -> Self {
        ActionError::Network(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    CopyBackupUrl,
    GenerateSchedule,
}

impl ActionKind {
    pub fn success_message(&self) -> &'static str {
        match self {
            ActionKind::CopyBackupUrl => "Copied backup URL to clipboard!",
            ActionKind::GenerateSchedule => "CRON expression generated successfully",
        }
    }

    pub fn failure_message(&self, error: &ActionError) -> String {
        match (self, error) {
            (ActionKind::CopyBackupUrl, ActionError::Network(_) | ActionError::Upstream { .. }) => {
                "Failed to fetch download URL.".into()
            }
            (ActionKind::CopyBackupUrl, ActionError::Malformed { .. }) => {
                "Failed to parse download response.".into()
            }
            (ActionKind::CopyBackupUrl, ActionError::MissingField { .. }) => {
                "No URL found in response.".into()
            }
            (ActionKind::GenerateSchedule, ActionError::Network(reason)) => {
                format!("Request failed: {}", reason)
            }
            (ActionKind::GenerateSchedule, ActionError::Upstream { status }) => {
                format!("Request failed: HTTP {}", status)
            }
            (ActionKind::GenerateSchedule, ActionError::Malformed { .. }) => {
                "Invalid response from server".into()
            }
            (ActionKind::GenerateSchedule, ActionError::MissingField { .. }) => {
                "Missing CRON fields in response".into()
            }
            (_, ActionError::EmptyInput) => "Please type something".into(),
            (_, ActionError::MissingControl(_)) => "Schedule form fields not found".into(),
            (_, ActionError::Clipboard(_)) => "Could not write to the clipboard.".into(),
            (_, ActionError::Dom(_)) => "The page changed before the action finished.".into(),
        }
    }
}
