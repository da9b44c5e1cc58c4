use crate::action::executor::ControlBinding;
use crate::dom::clock::Clock;
use crate::dom::host::{DomError, HostDom, NodeId};
use crate::view::view_model::View;

/// What an anchor currently represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorState {
    /// Natural key to resolve through the correlation index.
    pub key: Option<String>,
    /// Changes whenever the anchor needs processing again.
    pub token: String,
}

/// Result of processing one anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Root of an inserted fragment; `None` when the anchor was rewritten in place.
    pub fragment: Option<NodeId>,
    pub binding: Option<ControlBinding>,
    /// Inserted through the fallback path.
    pub degraded: bool,
}

impl Applied {
    pub fn rewritten() -> Self {
        Self {
            fragment: None,
            binding: None,
            degraded: false,
        }
    }
}

pub struct ApplyContext<'a> {
    pub clock: &'a dyn Clock,
    pub server_id: Option<&'a str>,
    /// Id the anchor's key resolved to, for features that need one.
    pub resolved: Option<&'a str>,
}

/// One kind of injected affordance.
pub trait Feature {
    fn name(&self) -> &'static str;

    fn applies_to(&self, view: View) -> bool;

    fn anchor_selector(&self) -> &'static str;

    /// Anchors must resolve through the correlation index before `apply`.
    fn requires_resolution(&self) -> bool {
        false
    }

    /// One-off page setup, run the first time the feature becomes active.
    fn install(&self, _dom: &mut dyn HostDom) -> Result<(), DomError> {
        Ok(())
    }

    /// `None` when the anchor does not qualify (yet).
    fn inspect(&self, dom: &mut dyn HostDom, anchor: NodeId) -> Result<Option<AnchorState>, DomError>;

    /// `None` when there is nowhere to insert; the anchor stays unmarked and
    /// is retried on the next settle.
    fn apply(
        &self,
        dom: &mut dyn HostDom,
        anchor: NodeId,
        state: &AnchorState,
        cx: &ApplyContext<'_>,
    ) -> Result<Option<Applied>, DomError>;
}
