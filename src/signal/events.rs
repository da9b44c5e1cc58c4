use serde::{Deserialize, Serialize};

use crate::dom::host::{DomError, NodeId};
use crate::signal::navigation::NavSource;

/// Something the host page reported since the last poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A wrapped history entry point (push/replace) or popstate fired.
    Navigation { source: NavSource },
    /// `count` raw mutation records under the body.
    Mutations { count: u32 },
    /// The user clicked an injected control.
    Click { node: NodeId },
    /// The page is going away; no further events will arrive.
    Unload,
}

pub trait EventSource {
    fn poll_events(&mut self) -> Result<Vec<HostEvent>, DomError>;
}
