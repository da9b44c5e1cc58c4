use std::time::Duration;

use tracing::{debug, info};

use crate::dom::clock::Clock;
use crate::dom::host::{DomError, HostDom};
use crate::dom::wait::{WaitOutcome, await_condition};
use crate::view::view_model::{BackupKind, View};

pub const HEADING_SELECTOR: &str = ".page-header-title-heading-title";

pub const USER_BACKUPS_HEADING: &str = "User Backups";
pub const SYSTEM_BACKUPS_HEADING: &str = "System Backups";

/// Result of one classification, kept for the activation it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub view: View,
    pub path: String,
    pub headings: Vec<String>,
    pub heading_timed_out: bool,
}

impl Classification {
    /// `/server/{id}/...` → `{id}`.
    pub fn server_id(&self) -> Option<&str> {
        server_id(&self.path)
    }
}

pub fn server_id(path: &str) -> Option<&str> {
    let mut segments = path.split('/');
    segments.next()?;
    if segments.next()? != "server" {
        return None;
    }
    segments.next().filter(|id| !id.is_empty())
}

/// Pure classification: same path and headings always give the same view.
pub fn classify_parts(path: &str, headings: &[String]) -> View {
    if server_id(path).is_none() {
        return View::Other;
    }
    if path.ends_with("/backups") {
        if headings.iter().any(|h| h.starts_with(USER_BACKUPS_HEADING)) {
            return View::Backups(BackupKind::User);
        }
        if headings.iter().any(|h| h.starts_with(SYSTEM_BACKUPS_HEADING)) {
            return View::Backups(BackupKind::System);
        }
        return View::Other;
    }
    if path.contains("/schedules") {
        return View::Schedules;
    }
    if path.contains("/files") {
        return View::Files;
    }
    View::Other
}

/// Paths where the heading decides the view, so it is worth waiting for.
pub fn path_needs_heading(path: &str) -> bool {
    server_id(path).is_some() && path.ends_with("/backups")
}

/// Trimmed text of every heading element currently rendered.
pub fn sample_headings<D: HostDom + ?Sized>(dom: &mut D) -> Result<Vec<String>, DomError> {
    let mut headings = Vec::new();
    for node in dom.query_all(None, HEADING_SELECTOR)? {
        match dom.text_content(node) {
            Ok(text) => headings.push(text.trim().to_string()),
            Err(e) if e.is_detached() => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(headings)
}

#[derive(Debug, Clone)]
pub struct ViewMatcher {
    pub heading_interval: Duration,
    pub heading_timeout: Duration,
}

impl Default for ViewMatcher {
    fn default() -> Self {
        Self {
            heading_interval: Duration::from_millis(100),
            heading_timeout: Duration::from_secs(8),
        }
    }
}

impl ViewMatcher {
    pub fn new(heading_interval: Duration, heading_timeout: Duration) -> Self {
        Self {
            heading_interval,
            heading_timeout,
        }
    }

    /// Classify the current page, waiting a bounded time for the host to
    /// render its heading when the path alone is ambiguous.
    pub fn classify<D: HostDom + ?Sized>(
        &self,
        dom: &mut D,
        clock: &dyn Clock,
    ) -> Result<Classification, DomError> {
        let path = dom.location_path()?;
        let mut heading_timed_out = false;

        let headings = if path_needs_heading(&path) {
            let mut failure = None;
            let outcome = await_condition(clock, self.heading_interval, self.heading_timeout, || {
                match sample_headings(dom) {
                    Ok(found) if !found.is_empty() => Some(found),
                    Ok(_) => None,
                    Err(e) if e.is_detached() => None,
                    Err(e) => {
                        failure.get_or_insert(e);
                        Some(Vec::new())
                    }
                }
            });
            if let Some(e) = failure {
                return Err(e);
            }
            match outcome {
                WaitOutcome::Ready(found) => found,
                WaitOutcome::TimedOut { waited } => {
                    info!(path = %path, waited_ms = waited.as_millis() as u64, "heading not found in time");
                    heading_timed_out = true;
                    Vec::new()
                }
            }
        } else {
            sample_headings(dom)?
        };

        let view = classify_parts(&path, &headings);
        debug!(path = %path, view = %view, "classified view");
        Ok(Classification {
            view,
            path,
            headings,
            heading_timed_out,
        })
    }
}
