use std::collections::HashMap;

use crate::dom::host::{DomError, HostDom, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub token: String,
    /// Root of what we inserted for this anchor, if anything.
    pub fragment: Option<NodeId>,
}

/// Weak anchor → version-token association, per feature.
///
/// Entries for anchors that have left the document are pruned on every scan,
/// so the map never outlives the nodes it describes.
#[derive(Debug, Default)]
pub struct ProcessedMarks {
    marks: HashMap<(&'static str, NodeId), Mark>,
}

impl ProcessedMarks {
    pub fn get(&self, feature: &'static str, anchor: NodeId) -> Option<&Mark> {
        self.marks.get(&(feature, anchor))
    }

    pub fn set(&mut self, feature: &'static str, anchor: NodeId, mark: Mark) {
        self.marks.insert((feature, anchor), mark);
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// True when the anchor is processed for exactly this token and whatever
    /// we inserted for it is still attached. A fragment the host re-rendered
    /// away counts as unprocessed.
    pub fn is_current<D: HostDom + ?Sized>(
        &self,
        dom: &mut D,
        feature: &'static str,
        anchor: NodeId,
        token: &str,
    ) -> Result<bool, DomError> {
        match self.get(feature, anchor) {
            Some(mark) if mark.token == token => match mark.fragment {
                Some(fragment) => dom.is_connected(fragment),
                None => Ok(true),
            },
            _ => Ok(false),
        }
    }

    pub fn prune<D: HostDom + ?Sized>(&mut self, dom: &mut D) -> Result<usize, DomError> {
        let mut gone = Vec::new();
        for (key, _) in self.marks.iter() {
            if !dom.is_connected(key.1)? {
                gone.push(*key);
            }
        }
        for key in &gone {
            self.marks.remove(key);
        }
        Ok(gone.len())
    }
}
