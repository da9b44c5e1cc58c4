use crate::dom::host::{DomError, Fragment, HostDom, NodeId, Placement};
use crate::inject::feature::{AnchorState, Applied, ApplyContext, Feature};
use crate::view::view_model::{BackupKind, View};

const NOTE: &str = r#"<div class="system-backup-note"><strong>The extension you installed allows you to grab system backup URLs; however, they&#39;re not officially implemented and will be 100% slower. This was done out of curiosity.</strong></div>"#;

/// Explains, once, why system backups get a copy button at all.
pub struct SystemBackupNote;

impl Feature for SystemBackupNote {
    fn name(&self) -> &'static str {
        "system-backup-note"
    }

    fn applies_to(&self, view: View) -> bool {
        view == View::Backups(BackupKind::System)
    }

    fn anchor_selector(&self) -> &'static str {
        ".alert-body > div"
    }

    fn inspect(&self, _dom: &mut dyn HostDom, _anchor: NodeId) -> Result<Option<AnchorState>, DomError> {
        Ok(Some(AnchorState {
            key: None,
            token: "note".into(),
        }))
    }

    fn apply(
        &self,
        dom: &mut dyn HostDom,
        anchor: NodeId,
        _state: &AnchorState,
        _cx: &ApplyContext<'_>,
    ) -> Result<Option<Applied>, DomError> {
        let note = dom.insert(&Fragment::new(NOTE), Placement::Append(anchor))?;
        Ok(Some(Applied {
            fragment: Some(note),
            binding: None,
            degraded: false,
        }))
    }
}
