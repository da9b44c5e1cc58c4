use std::cell::RefCell;
use std::rc::Rc;

use panel_augment::api::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use panel_augment::correlate::correlator::{CorrelationError, ListingSource};
use panel_augment::correlate::index::ListingRecord;
use panel_augment::view::view_model::BackupKind;

enum Reply {
    Respond(u16, String),
    Fail(String),
}

struct Route {
    url_contains: String,
    reply: Reply,
}

#[derive(Default)]
struct Inner {
    routes: Vec<Route>,
    requests: Vec<HttpRequest>,
}

/// Transport answering by URL substring. Clones share routes and the request
/// log, so a test can keep a handle after boxing one into the runtime.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    inner: Rc<RefCell<Inner>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url_contains: &str, status: u16, body: &str) -> Self {
        self.inner.borrow_mut().routes.push(Route {
            url_contains: url_contains.to_string(),
            reply: Reply::Respond(status, body.to_string()),
        });
        self
    }

    pub fn fail(self, url_contains: &str, message: &str) -> Self {
        self.inner.borrow_mut().routes.push(Route {
            url_contains: url_contains.to_string(),
            reply: Reply::Fail(message.to_string()),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.borrow().requests.clone()
    }

    pub fn count(&self, url_contains: &str) -> usize {
        self.inner
            .borrow()
            .requests
            .iter()
            .filter(|r| r.url.contains(url_contains))
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut inner = self.inner.borrow_mut();
        inner.requests.push(request.clone());
        // Latest matching route wins.
        let reply = inner
            .routes
            .iter()
            .rev()
            .find(|r| request.url.contains(&r.url_contains))
            .map(|r| match &r.reply {
                Reply::Respond(status, body) => Ok(HttpResponse {
                    status: *status,
                    body: body.clone(),
                }),
                Reply::Fail(message) => Err(TransportError::Network(message.clone())),
            });
        reply.unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 404,
                body: String::new(),
            })
        })
    }
}

/// Listing source with fixed records; counts fetches.
#[derive(Default)]
pub struct StaticListing {
    pub records: Vec<ListingRecord>,
    pub status: Option<u16>,
    pub fetches: RefCell<Vec<(String, BackupKind)>>,
}

impl StaticListing {
    pub fn with(records: &[(&str, &str)]) -> Self {
        Self {
            records: records
                .iter()
                .map(|(key, id)| ListingRecord::new(*key, *id))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.borrow().len()
    }
}

impl ListingSource for StaticListing {
    fn fetch_listing(
        &self,
        server_id: &str,
        kind: BackupKind,
    ) -> Result<Vec<ListingRecord>, CorrelationError> {
        self.fetches.borrow_mut().push((server_id.to_string(), kind));
        match self.status {
            Some(status) => Err(CorrelationError::Upstream { status }),
            None => Ok(self.records.clone()),
        }
    }
}
