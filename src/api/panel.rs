use serde::Deserialize;

use crate::action::error::ActionError;
use crate::api::transport::{HttpRequest, Transport};
use crate::correlate::correlator::{CorrelationError, ListingSource};
use crate::correlate::index::ListingRecord;
use crate::view::view_model::BackupKind;

pub const PANEL_ACCEPT: &str = "Application/vnd.pterodactyl.v1+json";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Deserialize)]
struct ListingEnvelope {
    data: Vec<ListingItem>,
}

#[derive(Deserialize)]
struct ListingItem {
    attributes: BackupAttributes,
}

#[derive(Deserialize)]
struct BackupAttributes {
    uuid: String,
    #[serde(default)]
    checksum: Option<String>,
}

#[derive(Deserialize)]
struct DownloadEnvelope {
    #[serde(default)]
    attributes: Option<DownloadAttributes>,
}

#[derive(Deserialize)]
struct DownloadAttributes {
    #[serde(default)]
    url: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// The panel's client API: backup listing and signed download URLs.
#[derive(Debug, Clone)]
pub struct PanelApi {
    pub origin: String,
    pub api_token: String,
}

impl PanelApi {
    pub fn new(origin: &str, api_token: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        }
    }

    pub fn listing_url(&self, server_id: &str, kind: BackupKind) -> String {
        let collection = match kind {
            BackupKind::User => "backups",
            BackupKind::System => "system-backups",
        };
        format!("{}/api/client/servers/{}/{}", self.origin, server_id, collection)
    }

    pub fn download_endpoint(&self, server_id: &str, backup_uuid: &str) -> String {
        format!(
            "{}/api/client/servers/{}/backups/{}/download",
            self.origin, server_id, backup_uuid
        )
    }

    fn authorized(&self, request: HttpRequest) -> HttpRequest {
        request
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Accept", PANEL_ACCEPT)
            .header("Content-Type", "application/json")
    }

    /// Checksum → UUID records. Backups that have no checksum yet (still
    /// running) are left out.
    pub fn list_backups(
        &self,
        transport: &dyn Transport,
        server_id: &str,
        kind: BackupKind,
    ) -> Result<Vec<ListingRecord>, CorrelationError> {
        let request = self.authorized(HttpRequest::get(self.listing_url(server_id, kind)));
        let response = transport
            .send(&request)
            .map_err(|e| CorrelationError::Network(e.to_string()))?;
        if !response.is_success() {
            return Err(CorrelationError::Upstream {
                status: response.status,
            });
        }

        let envelope: ListingEnvelope = serde_json::from_str(&response.body)
            .map_err(|e| CorrelationError::Malformed(e.to_string()))?;
        Ok(envelope
            .data
            .into_iter()
            .filter_map(|item| {
                let checksum = item.attributes.checksum?;
                Some(ListingRecord::new(checksum, item.attributes.uuid))
            })
            .collect())
    }

    pub fn resolve_download_url(
        &self,
        transport: &dyn Transport,
        server_id: &str,
        backup_uuid: &str,
    ) -> Result<String, ActionError> {
        let request = self.authorized(HttpRequest::get(
            self.download_endpoint(server_id, backup_uuid),
        ));
        let response = transport.send(&request)?;
        if !response.is_success() {
            return Err(ActionError::Upstream {
                status: response.status,
            });
        }

        let envelope: DownloadEnvelope =
            serde_json::from_str(&response.body).map_err(|e| ActionError::Malformed {
                context: "download response",
                detail: e.to_string(),
            })?;
        envelope
            .attributes
            .and_then(|a| a.url)
            .filter(|url| !url.is_empty())
            .ok_or(ActionError::MissingField {
                field: "attributes.url",
            })
    }
}

/// `PanelApi` bound to a transport, as the correlator's listing source.
pub struct PanelListing<'a> {
    pub api: &'a PanelApi,
    pub transport: &'a dyn Transport,
}

impl ListingSource for PanelListing<'_> {
    fn fetch_listing(
        &self,
        server_id: &str,
        kind: BackupKind,
    ) -> Result<Vec<ListingRecord>, CorrelationError> {
        self.api.list_backups(self.transport, server_id, kind)
    }
}
