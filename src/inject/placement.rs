use tracing::warn;

use crate::dom::host::{DomError, HostDom, NodeId, Placement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    After,
    Before,
}

/// How to find a stable insertion point next to host controls.
///
/// `marker` names a sibling control by its own semantic marker (an icon id, a
/// label). The match is lifted to its `lift_to` ancestor and the fragment goes
/// on `side` of it. Without the marker the fragment is appended to the
/// container instead.
#[derive(Debug, Clone, Copy)]
pub struct InsertionSpec {
    /// Container under the anchor; `None` uses the anchor itself.
    pub container: Option<&'static str>,
    pub marker: &'static str,
    pub marker_text: Option<&'static str>,
    pub lift_to: &'static str,
    pub side: Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located {
    Adjacent(Placement),
    /// Marker missing; appended to the container.
    Fallback(Placement),
    /// No container either; nothing to insert into.
    Missing,
}

impl Located {
    pub fn placement(&self) -> Option<Placement> {
        match self {
            Located::Adjacent(p) | Located::Fallback(p) => Some(*p),
            Located::Missing => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, Located::Adjacent(_))
    }
}

pub fn locate<D: HostDom + ?Sized>(
    dom: &mut D,
    feature: &'static str,
    anchor: NodeId,
    spec: &InsertionSpec,
) -> Result<Located, DomError> {
    let container = match spec.container {
        Some(selector) => match dom.query_all(Some(anchor), selector)?.into_iter().next() {
            Some(found) => found,
            None => {
                warn!(feature, %anchor, container = selector, "insertion container not found");
                return Ok(Located::Missing);
            }
        },
        None => anchor,
    };

    for candidate in dom.query_all(Some(container), spec.marker)? {
        if let Some(text) = spec.marker_text {
            if !dom.text_content(candidate)?.contains(text) {
                continue;
            }
        }
        if let Some(target) = dom.closest(candidate, spec.lift_to)? {
            let placement = match spec.side {
                Side::After => Placement::After(target),
                Side::Before => Placement::Before(target),
            };
            return Ok(Located::Adjacent(placement));
        }
    }

    warn!(
        feature,
        %anchor,
        marker = spec.marker,
        "insertion marker not found, appending to container"
    );
    Ok(Located::Fallback(Placement::Append(container)))
}
