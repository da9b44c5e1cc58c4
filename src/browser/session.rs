use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::dom::host::{DomError, Fragment, HostDom, NodeId, Placement};
use crate::notify::toast::DEFAULT_TOAST_DURATION;
use crate::notify::{Clipboard, ClipboardError, Notification, NotificationSink, Severity};
use crate::signal::events::{EventSource, HostEvent};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to spawn bridge '{script}': {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bridge I/O: {0}")]
    Io(String),

    #[error("bridge JSON ({context}): {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("bridge command '{command}' failed: {error}")]
    Protocol {
        command: &'static str,
        kind: Option<String>,
        error: String,
    },
}

impl SessionError {
    /// Map a bridge failure onto the page-level error the engine reasons about.
    pub fn into_dom(self, node: Option<NodeId>, selector: Option<&str>) -> DomError {
        match (&self, node, selector) {
            (SessionError::Protocol { kind: Some(k), .. }, _, _) if k == "replaced" => {
                DomError::Replaced
            }
            (SessionError::Protocol { kind: Some(k), .. }, Some(node), _) if k == "detached" => {
                DomError::Detached(node)
            }
            (SessionError::Protocol { kind: Some(k), error, .. }, _, Some(selector))
                if k == "selector" =>
            {
                DomError::Selector {
                    selector: selector.to_string(),
                    reason: error.clone(),
                }
            }
            _ => DomError::Bridge(self.to_string()),
        }
    }
}

/// Request sent to the page bridge over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BridgeRequest<'a> {
    Navigate { url: &'a str },
    InstallHooks,
    Events,
    Location,
    QueryAll { scope: Option<NodeId>, selector: &'a str },
    Text { node: NodeId },
    Attr { node: NodeId, name: &'a str },
    Closest { node: NodeId, selector: &'a str },
    Connected { node: NodeId },
    Insert { html: &'a str, placement: Placement },
    Remove { node: NodeId },
    SetText { node: NodeId, text: &'a str },
    SetAttr { node: NodeId, name: &'a str, value: &'a str },
    RemoveAttr { node: NodeId, name: &'a str },
    Value { node: NodeId },
    SetBoundValue { node: NodeId, value: &'a str },
    AddStyle { css: &'a str },
    Clipboard { text: &'a str },
    Toast { severity: &'a str, message: &'a str, duration_ms: u64 },
    Quit,
}

impl BridgeRequest<'_> {
    fn name(&self) -> &'static str {
        match self {
            BridgeRequest::Navigate { .. } => "navigate",
            BridgeRequest::InstallHooks => "install_hooks",
            BridgeRequest::Events => "events",
            BridgeRequest::Location => "location",
            BridgeRequest::QueryAll { .. } => "query_all",
            BridgeRequest::Text { .. } => "text",
            BridgeRequest::Attr { .. } => "attr",
            BridgeRequest::Closest { .. } => "closest",
            BridgeRequest::Connected { .. } => "connected",
            BridgeRequest::Insert { .. } => "insert",
            BridgeRequest::Remove { .. } => "remove",
            BridgeRequest::SetText { .. } => "set_text",
            BridgeRequest::SetAttr { .. } => "set_attr",
            BridgeRequest::RemoveAttr { .. } => "remove_attr",
            BridgeRequest::Value { .. } => "value",
            BridgeRequest::SetBoundValue { .. } => "set_bound_value",
            BridgeRequest::AddStyle { .. } => "add_style",
            BridgeRequest::Clipboard { .. } => "clipboard",
            BridgeRequest::Toast { .. } => "toast",
            BridgeRequest::Quit => "quit",
        }
    }
}

/// Response received from the bridge over stdout (one JSON line).
#[derive(Debug, Default, Deserialize)]
pub struct BridgeResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Machine-readable error class: `detached`, `selector`, ...
    #[serde(default)]
    pub error_kind: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub node: Option<NodeId>,
    #[serde(default)]
    pub nodes: Option<Vec<NodeId>>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub connected: Option<bool>,
    #[serde(default)]
    pub events: Option<Vec<HostEvent>>,
}

/// A live panel page, driven through a long-lived bridge process.
///
/// The bridge keeps a Chromium page open, hands out stable integer handles
/// for elements, and buffers history/popstate/mutation/click events until the
/// next `events` request. Commands are NDJSON over stdin, responses NDJSON on
/// stdout.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    toast_duration: Duration,
    closed: bool,
}

/// The bridge command showing `notification` for `duration`.
pub fn toast_request(notification: &Notification, duration: Duration) -> BridgeRequest<'_> {
    let severity = match notification.severity {
        Severity::Info => "info",
        Severity::Success => "success",
        Severity::Error => "error",
    };
    BridgeRequest::Toast {
        severity,
        message: &notification.message,
        duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
    }
}

impl BrowserSession {
    /// Spawn `node <script>` and wait for its ready line.
    pub fn launch(script: &Path) -> Result<Self, SessionError> {
        let mut child = Command::new("node")
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SessionError::Spawn {
                script: script.display().to_string(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SessionError::Io("failed to capture bridge stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::Io("failed to capture bridge stdout".into()))?;
        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| SessionError::Io(format!("failed to read ready signal: {}", e)))?;
        let response: BridgeResponse =
            serde_json::from_str(line.trim()).map_err(|e| SessionError::Json {
                context: "ready signal",
                source: e,
            })?;
        if !response.ok || response.ready != Some(true) {
            return Err(SessionError::Protocol {
                command: "launch",
                kind: None,
                error: "bridge did not signal ready".into(),
            });
        }

        Ok(Self {
            child,
            stdin,
            reader,
            toast_duration: DEFAULT_TOAST_DURATION,
            closed: false,
        })
    }

    /// How long page toasts stay up before dismissing themselves.
    pub fn with_toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }

    fn send(&mut self, request: &BridgeRequest<'_>) -> Result<BridgeResponse, SessionError> {
        let json = serde_json::to_string(request).map_err(|e| SessionError::Json {
            context: "request",
            source: e,
        })?;
        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| SessionError::Io(format!("failed to write to bridge: {}", e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| SessionError::Io(format!("failed to read from bridge: {}", e)))?;
        if line.trim().is_empty() {
            return Err(SessionError::Io(
                "empty response from bridge (process may have died)".into(),
            ));
        }

        let response: BridgeResponse =
            serde_json::from_str(line.trim()).map_err(|e| SessionError::Json {
                context: "response",
                source: e,
            })?;
        if !response.ok {
            return Err(SessionError::Protocol {
                command: request.name(),
                kind: response.error_kind,
                error: response.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        Ok(response)
    }

    fn call(&mut self, request: &BridgeRequest<'_>, node: Option<NodeId>) -> Result<BridgeResponse, DomError> {
        let selector = match request {
            BridgeRequest::QueryAll { selector, .. } | BridgeRequest::Closest { selector, .. } => {
                Some(selector.to_string())
            }
            _ => None,
        };
        self.send(request)
            .map_err(|e| e.into_dom(node, selector.as_deref()))
    }

    pub fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.send(&BridgeRequest::Navigate { url })?;
        Ok(())
    }

    /// Wrap history entry points and start the mutation observer in the page.
    pub fn install_hooks(&mut self) -> Result<(), SessionError> {
        self.send(&BridgeRequest::InstallHooks)?;
        Ok(())
    }

    pub fn quit(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // The process may already be gone.
        if let Err(e) = self.send(&BridgeRequest::Quit) {
            debug!(error = %e, "bridge quit");
        }
        let _ = self.child.wait();
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}

fn missing(command: &str, field: &str) -> DomError {
    DomError::Bridge(format!("'{}' response has no '{}'", command, field))
}

impl HostDom for BrowserSession {
    fn location_path(&mut self) -> Result<String, DomError> {
        self.call(&BridgeRequest::Location, None)?
            .path
            .ok_or_else(|| missing("location", "path"))
    }

    fn query_all(&mut self, scope: Option<NodeId>, selector: &str) -> Result<Vec<NodeId>, DomError> {
        Ok(self
            .call(&BridgeRequest::QueryAll { scope, selector }, scope)?
            .nodes
            .unwrap_or_default())
    }

    fn text_content(&mut self, node: NodeId) -> Result<String, DomError> {
        Ok(self
            .call(&BridgeRequest::Text { node }, Some(node))?
            .text
            .unwrap_or_default())
    }

    fn attribute(&mut self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.call(&BridgeRequest::Attr { node, name }, Some(node))?.text)
    }

    fn closest(&mut self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self
            .call(&BridgeRequest::Closest { node, selector }, Some(node))?
            .node)
    }

    fn is_connected(&mut self, node: NodeId) -> Result<bool, DomError> {
        match self.call(&BridgeRequest::Connected { node }, Some(node)) {
            Ok(response) => Ok(response.connected.unwrap_or(false)),
            Err(DomError::Detached(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn insert(&mut self, fragment: &Fragment, placement: Placement) -> Result<NodeId, DomError> {
        let request = BridgeRequest::Insert {
            html: &fragment.html,
            placement,
        };
        self.call(&request, Some(placement.target()))?
            .node
            .ok_or_else(|| missing("insert", "node"))
    }

    fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.call(&BridgeRequest::Remove { node }, Some(node))?;
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.call(&BridgeRequest::SetText { node, text }, Some(node))?;
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.call(&BridgeRequest::SetAttr { node, name, value }, Some(node))?;
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.call(&BridgeRequest::RemoveAttr { node, name }, Some(node))?;
        Ok(())
    }

    fn value(&mut self, node: NodeId) -> Result<String, DomError> {
        Ok(self
            .call(&BridgeRequest::Value { node }, Some(node))?
            .text
            .unwrap_or_default())
    }

    fn set_bound_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.call(&BridgeRequest::SetBoundValue { node, value }, Some(node))?;
        Ok(())
    }

    fn add_style(&mut self, css: &str) -> Result<(), DomError> {
        self.call(&BridgeRequest::AddStyle { css }, None)?;
        Ok(())
    }
}

impl Clipboard for BrowserSession {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.send(&BridgeRequest::Clipboard { text })
            .map(|_| ())
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

impl NotificationSink for BrowserSession {
    fn notify(&mut self, notification: Notification) {
        let request = toast_request(&notification, self.toast_duration);
        if let Err(e) = self.send(&request) {
            warn!(error = %e, message = %notification.message, "could not show toast");
        }
    }
}

impl EventSource for BrowserSession {
    fn poll_events(&mut self) -> Result<Vec<HostEvent>, DomError> {
        Ok(self
            .call(&BridgeRequest::Events, None)?
            .events
            .unwrap_or_default())
    }
}
