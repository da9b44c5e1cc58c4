use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    User,
    System,
}

/// Logical page state. Derived from location and heading text, never stored
/// beyond one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Backups(BackupKind),
    Schedules,
    Files,
    Other,
}

impl View {
    pub fn tag(&self) -> &'static str {
        match self {
            View::Backups(BackupKind::User) => "backups:user",
            View::Backups(BackupKind::System) => "backups:system",
            View::Schedules => "schedules",
            View::Files => "files",
            View::Other => "none",
        }
    }

    pub fn is_of_interest(&self) -> bool {
        !matches!(self, View::Other)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
