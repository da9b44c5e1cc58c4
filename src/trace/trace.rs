use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::correlate::index::IndexState;
use crate::inject::engine::EvaluationReport;
use crate::signal::gate::Settle;

#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: i64,
    pub evaluation: u64,

    pub activation: Option<u64>,
    pub view: String,
    pub trigger: String,

    pub injected: usize,
    pub updated: usize,
    pub skipped_unresolved: usize,

    pub index_state: Option<IndexState>,

    pub action: Option<String>,
    pub outcome: Option<String>,
}

impl TraceEvent {
    pub fn at(now: DateTime<Utc>, evaluation: u64) -> Self {
        Self {
            timestamp_ms: now.timestamp_millis(),
            evaluation,
            activation: None,
            view: "none".into(),
            trigger: "mutations".into(),
            injected: 0,
            updated: 0,
            skipped_unresolved: 0,
            index_state: None,
            action: None,
            outcome: None,
        }
    }

    pub fn with_report(mut self, report: &EvaluationReport) -> Self {
        self.activation = report.activation.map(|a| a.0);
        if let Some(view) = report.view {
            self.view = view.tag().to_string();
        }
        self.injected = report.injected;
        self.updated = report.updated;
        self.skipped_unresolved = report.skipped_unresolved;
        self.index_state = report.index_state.clone();
        self
    }

    pub fn with_settle(mut self, settle: &Settle) -> Self {
        self.trigger = match settle.navigation {
            Some(source) => format!("navigation:{:?}", source).to_lowercase(),
            None => format!("mutations:{}", settle.coalesced),
        };
        self
    }

    pub fn with_action(mut self, action: impl ToString, outcome: impl ToString) -> Self {
        self.trigger = "click".into();
        self.action = Some(action.to_string());
        self.outcome = Some(outcome.to_string());
        self
    }
}
