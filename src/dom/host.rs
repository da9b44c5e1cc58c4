use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notify::{Clipboard, NotificationSink};

/// Opaque handle to a host-owned DOM node.
///
/// Handles are never reused for a different node within one page lifetime,
/// so they are safe to use as keys of a weak "already processed" association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a fragment lands relative to an existing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "node", rename_all = "snake_case")]
pub enum Placement {
    After(NodeId),
    Before(NodeId),
    Append(NodeId),
}

impl Placement {
    pub fn target(&self) -> NodeId {
        match self {
            Placement::After(n) | Placement::Before(n) | Placement::Append(n) => *n,
        }
    }
}

/// Markup for one injected element (single root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub html: String,
}

impl Fragment {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

#[derive(Debug, Error)]
pub enum DomError {
    #[error("node {0} is no longer attached to the document")]
    Detached(NodeId),

    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("fragment did not produce an element: {0}")]
    Fragment(String),

    #[error("host bridge failure: {0}")]
    Bridge(String),

    /// The page loaded a new document while the command was in flight.
    #[error("the document was replaced")]
    Replaced,
}

impl DomError {
    /// The node went away underneath us; callers treat this as "not present".
    pub fn is_detached(&self) -> bool {
        matches!(self, DomError::Detached(_))
    }

    /// Errors that end the current evaluation instead of one anchor.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomError::Bridge(_) | DomError::Replaced)
    }
}

/// Read/write access to the host page.
///
/// Everything the engine knows about the page goes through this trait. Host
/// markup is versioned independently, so callers must expect empty query
/// results and detached nodes at any point.
pub trait HostDom {
    /// `location.pathname` of the current page.
    fn location_path(&mut self) -> Result<String, DomError>;

    /// All elements under `scope` (or the whole document) matching `selector`,
    /// in document order. The scope element itself is never included.
    fn query_all(&mut self, scope: Option<NodeId>, selector: &str) -> Result<Vec<NodeId>, DomError>;

    fn text_content(&mut self, node: NodeId) -> Result<String, DomError>;

    fn attribute(&mut self, node: NodeId, name: &str) -> Result<Option<String>, DomError>;

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&mut self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError>;

    fn is_connected(&mut self, node: NodeId) -> Result<bool, DomError>;

    /// Inserts `fragment` and returns the handle of its root element.
    fn insert(&mut self, fragment: &Fragment, placement: Placement) -> Result<NodeId, DomError>;

    fn remove(&mut self, node: NodeId) -> Result<(), DomError>;

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError>;

    /// Current `value` property of a form control.
    fn value(&mut self, node: NodeId) -> Result<String, DomError>;

    /// Set the value of a host-bound form control so the host framework sees it.
    ///
    /// Implementations go through the element's native value setter rather than
    /// the one the framework intercepts, then dispatch a bubbling `input` event.
    fn set_bound_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError>;

    /// Adds a page-level style rule.
    fn add_style(&mut self, css: &str) -> Result<(), DomError>;

    /// Whether the host can defer work to an idle callback.
    fn supports_idle(&self) -> bool {
        true
    }
}

/// A full host: page access plus the clipboard and the toast channel.
pub trait Host: HostDom + Clipboard + NotificationSink {}

impl<T: HostDom + Clipboard + NotificationSink> Host for T {}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
