use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// One activation of a view: from the navigation that entered it until the
/// next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActivationId(pub u64);

impl fmt::Display for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "activation-{}", self.0)
    }
}

/// One listing entry: the key visible in the page and the id the action needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub key: String,
    pub id: String,
}

impl ListingRecord {
    pub fn new(key: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EmptyReason {
    /// The page path carries no server id to build the listing URL from.
    MissingServer,
    Upstream { status: u16 },
    Network { message: String },
    Malformed { message: String },
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::MissingServer => write!(f, "no server id in path"),
            EmptyReason::Upstream { status } => write!(f, "listing returned HTTP {}", status),
            EmptyReason::Network { message } => write!(f, "listing request failed: {}", message),
            EmptyReason::Malformed { message } => write!(f, "listing was malformed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexState {
    Populated,
    Empty { reason: EmptyReason },
}

/// Natural key → resolved id, immutable for the activation that built it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationIndex {
    activation: ActivationId,
    entries: HashMap<String, String>,
    state: IndexState,
}

impl CorrelationIndex {
    pub fn from_records<I>(activation: ActivationId, records: I) -> Self
    where
        I: IntoIterator<Item = ListingRecord>,
    {
        let entries = records.into_iter().map(|r| (r.key, r.id)).collect();
        Self {
            activation,
            entries,
            state: IndexState::Populated,
        }
    }

    /// Fail-closed result: nothing resolves.
    pub fn empty(activation: ActivationId, reason: EmptyReason) -> Self {
        Self {
            activation,
            entries: HashMap::new(),
            state: IndexState::Empty { reason },
        }
    }

    pub fn activation(&self) -> ActivationId {
        self.activation
    }

    pub fn state(&self) -> &IndexState {
        &self.state
    }

    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
