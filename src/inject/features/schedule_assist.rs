use crate::action::executor::{Action, ControlBinding, ControlLabel};
use crate::dom::host::{DomError, Fragment, HostDom, NodeId};
use crate::format::time::format_offset;
use crate::inject::feature::{AnchorState, Applied, ApplyContext, Feature};
use crate::inject::placement::{InsertionSpec, Side, locate};
use crate::view::view_model::View;

pub const DIALOG_SELECTOR: &str = r#"[role="dialog"]"#;
pub const DIALOG_TITLE: &str = "Create Schedule";
pub const BOX_ID: &str = "ai-cron-box";
pub const INPUT_ID: &str = "ai-cron-input";
pub const GENERATE_ID: &str = "ai-cron-generate-btn";

// Above the cheatsheet toggle's floating wrapper.
const INSERTION: InsertionSpec = InsertionSpec {
    container: None,
    marker: "button",
    marker_text: Some("Show CRON Cheatsheet"),
    lift_to: ".floating-content",
    side: Side::Before,
};

const EXAMPLES: [&str; 6] = [
    "Run every Mon, Wed, Fri at 7:30am",
    "At 4pm on the 1st and 15th",
    "Every 10 minutes 9am to 5pm weekdays",
    "Daily at midnight",
    "Twice a day at 2am and 2pm",
    "Every hour on the half-hour",
];

/// Natural-language CRON box inside the "Create Schedule" dialog.
pub struct ScheduleAssistant;

fn assistant_markup(timezone_offset: &str) -> String {
    let examples: String = EXAMPLES.iter().map(|e| format!("<li>{}</li>", e)).collect();
    format!(
        r#"<div id="{BOX_ID}" class="mt-0 mb-0 p-4 bg-elevation-1 border border-blend-brd_mute rounded-lg text-sm"><label class="block text-xs uppercase text-neutral-200 mb-2">Describe a schedule in plain English</label><div class="flex"><input class="form-input form-input-primary flex-2 rounded-r-none" placeholder="e.g. Every 3 hours 20 minutes" id="{INPUT_ID}"><button class="btn btn-primary ml-2 space-x-2" id="{GENERATE_ID}">Generate</button></div><div class="mt-4 text-neutral-400 text-xs leading-relaxed"><p>Your description is converted to a CRON expression. Times are read in your timezone (<strong>{timezone_offset}</strong>) and shifted to UTC, which the scheduler uses.</p><p class="mt-3 font-semibold text-neutral-300">Examples:</p><ul style="list-style-type: disc; padding-left: 1.25rem; margin-top: 0.5rem;">{examples}</ul></div></div>"#
    )
}

impl Feature for ScheduleAssistant {
    fn name(&self) -> &'static str {
        "schedule-assistant"
    }

    fn applies_to(&self, view: View) -> bool {
        view == View::Schedules
    }

    fn anchor_selector(&self) -> &'static str {
        DIALOG_SELECTOR
    }

    fn inspect(&self, dom: &mut dyn HostDom, anchor: NodeId) -> Result<Option<AnchorState>, DomError> {
        if !dom.text_content(anchor)?.contains(DIALOG_TITLE) {
            return Ok(None);
        }
        Ok(Some(AnchorState {
            key: None,
            token: DIALOG_TITLE.into(),
        }))
    }

    fn apply(
        &self,
        dom: &mut dyn HostDom,
        anchor: NodeId,
        _state: &AnchorState,
        cx: &ApplyContext<'_>,
    ) -> Result<Option<Applied>, DomError> {
        let located = locate(dom, self.name(), anchor, &INSERTION)?;
        let Some(placement) = located.placement() else {
            return Ok(None);
        };

        let timezone_offset = format_offset(cx.clock.local_offset_minutes());
        let root = dom.insert(&Fragment::new(assistant_markup(&timezone_offset)), placement)?;

        let input = first(dom, root, INPUT_ID)?;
        let button = first(dom, root, GENERATE_ID)?;

        Ok(Some(Applied {
            fragment: Some(root),
            binding: Some(ControlBinding {
                control: button,
                action: Action::GenerateSchedule {
                    dialog: anchor,
                    input,
                    timezone_offset,
                },
                ready: ControlLabel::Text("Generate".into()),
                busy: ControlLabel::Text("...".into()),
            }),
            degraded: located.is_degraded(),
        }))
    }
}

fn first(dom: &mut dyn HostDom, root: NodeId, id: &str) -> Result<NodeId, DomError> {
    dom.query_all(Some(root), &format!("#{}", id))?
        .into_iter()
        .next()
        .ok_or_else(|| DomError::Fragment(format!("injected box lost '#{}'", id)))
}
