use tracing::debug;

use crate::dom::host::{DomError, HostDom, NodeId};
use crate::format::time::{describe_timestamp, parse_datetime};
use crate::inject::feature::{AnchorState, Applied, ApplyContext, Feature};
use crate::view::view_model::View;

pub const TIME_SELECTOR: &str = "time.z-1";

/// Lets the pointer reach folder rows' own timestamps.
pub const HOVER_FIX_CSS: &str = "a.link-subtle-blend::after { pointer-events: none !important; }";

/// Rewrites file-list timestamps as "N minutes ago" with the full date on hover.
pub struct RelativeTimestamps;

impl Feature for RelativeTimestamps {
    fn name(&self) -> &'static str {
        "relative-timestamps"
    }

    fn applies_to(&self, view: View) -> bool {
        view == View::Files
    }

    fn anchor_selector(&self) -> &'static str {
        TIME_SELECTOR
    }

    fn install(&self, dom: &mut dyn HostDom) -> Result<(), DomError> {
        dom.add_style(HOVER_FIX_CSS)
    }

    fn inspect(&self, dom: &mut dyn HostDom, anchor: NodeId) -> Result<Option<AnchorState>, DomError> {
        let Some(raw) = dom.attribute(anchor, "datetime")? else {
            return Ok(None);
        };
        if parse_datetime(&raw).is_none() {
            debug!(%anchor, datetime = %raw, "unparsable timestamp");
            return Ok(None);
        }
        Ok(Some(AnchorState {
            key: None,
            token: raw,
        }))
    }

    fn apply(
        &self,
        dom: &mut dyn HostDom,
        anchor: NodeId,
        state: &AnchorState,
        cx: &ApplyContext<'_>,
    ) -> Result<Option<Applied>, DomError> {
        let Some(instant) = parse_datetime(&state.token) else {
            return Ok(None);
        };
        let described = describe_timestamp(instant, cx.clock.now(), cx.clock.local_offset_minutes());
        dom.set_text(anchor, &described.text)?;
        dom.set_attribute(anchor, "title", &described.title)?;
        Ok(Some(Applied::rewritten()))
    }
}
