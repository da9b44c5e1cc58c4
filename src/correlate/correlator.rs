use thiserror::Error;
use tracing::{debug, error, info};

use crate::correlate::index::{ActivationId, CorrelationIndex, EmptyReason, ListingRecord};
use crate::view::view_model::BackupKind;

#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("listing returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("listing request failed: {0}")]
    Network(String),

    #[error("listing was malformed: {0}")]
    Malformed(String),
}

/// Remote listing the index is built from.
pub trait ListingSource {
    fn fetch_listing(
        &self,
        server_id: &str,
        kind: BackupKind,
    ) -> Result<Vec<ListingRecord>, CorrelationError>;
}

/// Builds one index per activation and refuses results for any other.
#[derive(Debug, Default)]
pub struct Correlator {
    current: Option<ActivationId>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self, activation: ActivationId) {
        self.current = Some(activation);
    }

    /// One fetch. Never fails: an error becomes an empty index with a reason.
    pub fn build(
        &self,
        activation: ActivationId,
        server_id: Option<&str>,
        kind: BackupKind,
        source: &dyn ListingSource,
    ) -> CorrelationIndex {
        let Some(server_id) = server_id else {
            info!(%activation, "no server id, correlation disabled");
            return CorrelationIndex::empty(activation, EmptyReason::MissingServer);
        };

        match source.fetch_listing(server_id, kind) {
            Ok(records) => {
                let index = CorrelationIndex::from_records(activation, records);
                debug!(%activation, entries = index.len(), "built correlation index");
                index
            }
            Err(e) => {
                error!(%activation, error = %e, "failed to fetch backups");
                let reason = match e {
                    CorrelationError::Upstream { status } => EmptyReason::Upstream { status },
                    CorrelationError::Network(message) => EmptyReason::Network { message },
                    CorrelationError::Malformed(message) => EmptyReason::Malformed { message },
                };
                CorrelationIndex::empty(activation, reason)
            }
        }
    }

    /// Pass the index through only if it belongs to the current activation.
    pub fn accept(&self, index: CorrelationIndex) -> Option<CorrelationIndex> {
        if self.current == Some(index.activation()) {
            Some(index)
        } else {
            debug!(stale = %index.activation(), "discarding index for superseded activation");
            None
        }
    }
}
