use crate::action::executor::{Action, ControlBinding, ControlLabel};
use crate::dom::host::{DomError, Fragment, HostDom, NodeId};
use crate::inject::feature::{AnchorState, Applied, ApplyContext, Feature};
use crate::inject::placement::{InsertionSpec, Side, locate};
use crate::view::view_model::View;

pub const CARD_SELECTOR: &str = ".card-body";
pub const CHECKSUM_SELECTOR: &str = "span.font-mono";
pub const CHECKSUM_PREFIX: &str = "restic-snapshot-id:";
pub const BUTTON_CLASS: &str = "copy-url-button";

const BUTTON_TITLE: &str = "Copy backup download URL";
const BUSY_TITLE: &str = "Fetching download URL…";

// The download button is found through its icon.
const INSERTION: InsertionSpec = InsertionSpec {
    container: Some("span.flex.items-center.justify-end"),
    marker: r#"button svg[data-icon="cloud-arrow-down"]"#,
    marker_text: None,
    lift_to: "button",
    side: Side::After,
};

const LINK_ICON: &str = r#"<svg aria-hidden="true" focusable="false" data-prefix="fas" data-icon="link" class="svg-inline--fa fa-link fa-fw" role="img" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 512 512" fill="currentColor" width="1em" height="1em"><path fill="currentColor" d="M326.6 185.4c12.5 12.5 12.5 32.8 0 45.3l-96 96c-12.5 12.5-32.8 12.5-45.3 0s-12.5-32.8 0-45.3l96-96c12.5-12.5 32.8-12.5 45.3 0zM232.6 79c50-50 131-50 181 0s50 131 0 181l-50.6 50.6c-12.5 12.5-32.8 12.5-45.3 0s-12.5-32.8 0-45.3L368.4 215c25-25 25-65.5 0-90.5s-65.5-25-90.5 0l-50.6 50.6c-12.5 12.5-32.8 12.5-45.3 0s-12.5-32.8 0-45.3L232.6 79zm-80.6 192.4c12.5 12.5 12.5 32.8 0 45.3L103.6 365c-25 25-25 65.5 0 90.5s65.5 25 90.5 0l50.6-50.6c12.5-12.5 32.8-12.5 45.3 0s12.5 32.8 0 45.3l-50.6 50.6c-50 50-131 50-181 0s-50-131 0-181l50.6-50.6c12.5-12.5 32.8-12.5 45.3 0z"/></svg>"#;

/// "Copy URL" button on every backup card whose snapshot id is in the listing.
pub struct BackupLinks;

impl Feature for BackupLinks {
    fn name(&self) -> &'static str {
        "backup-links"
    }

    fn applies_to(&self, view: View) -> bool {
        matches!(view, View::Backups(_))
    }

    fn anchor_selector(&self) -> &'static str {
        CARD_SELECTOR
    }

    fn requires_resolution(&self) -> bool {
        true
    }

    fn inspect(&self, dom: &mut dyn HostDom, anchor: NodeId) -> Result<Option<AnchorState>, DomError> {
        for span in dom.query_all(Some(anchor), CHECKSUM_SELECTOR)? {
            let text = dom.text_content(span)?;
            let text = text.trim();
            if text.starts_with(CHECKSUM_PREFIX) {
                return Ok(Some(AnchorState {
                    key: Some(text.to_string()),
                    token: text.to_string(),
                }));
            }
        }
        Ok(None)
    }

    fn apply(
        &self,
        dom: &mut dyn HostDom,
        anchor: NodeId,
        _state: &AnchorState,
        cx: &ApplyContext<'_>,
    ) -> Result<Option<Applied>, DomError> {
        let (Some(server_id), Some(backup_uuid)) = (cx.server_id, cx.resolved) else {
            return Ok(None);
        };
        let located = locate(dom, self.name(), anchor, &INSERTION)?;
        let Some(placement) = located.placement() else {
            return Ok(None);
        };

        let html = format!(
            r#"<button type="button" class="btn btn-ghost-neutral btn-icon {}" title="{}" style="margin-left: 0.2rem">{}</button>"#,
            BUTTON_CLASS, BUTTON_TITLE, LINK_ICON
        );
        let button = dom.insert(&Fragment::new(html), placement)?;

        Ok(Some(Applied {
            fragment: Some(button),
            binding: Some(ControlBinding {
                control: button,
                action: Action::CopyBackupUrl {
                    server_id: server_id.to_string(),
                    backup_uuid: backup_uuid.to_string(),
                },
                ready: ControlLabel::Title(BUTTON_TITLE.into()),
                busy: ControlLabel::Title(BUSY_TITLE.into()),
            }),
            degraded: located.is_degraded(),
        }))
    }
}
