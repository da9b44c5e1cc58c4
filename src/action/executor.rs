use tracing::{debug, info, warn};

use crate::action::error::{ActionError, ActionKind};
use crate::api::panel::PanelApi;
use crate::api::schedule::ScheduleTranslator;
use crate::api::transport::Transport;
use crate::dom::clock::Clock;
use crate::dom::host::{DomError, Host, HostDom, NodeId};
use crate::notify::Notification;

/// Side effect bound to one injected control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CopyBackupUrl {
        server_id: String,
        backup_uuid: String,
    },
    GenerateSchedule {
        dialog: NodeId,
        input: NodeId,
        timezone_offset: String,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CopyBackupUrl { .. } => ActionKind::CopyBackupUrl,
            Action::GenerateSchedule { .. } => ActionKind::GenerateSchedule,
        }
    }
}

/// How a control presents its state: its text, or its title for icon buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlLabel {
    Text(String),
    Title(String),
}

impl ControlLabel {
    fn apply<D: HostDom + ?Sized>(&self, dom: &mut D, control: NodeId) -> Result<(), DomError> {
        match self {
            ControlLabel::Text(text) => dom.set_text(control, text),
            ControlLabel::Title(title) => dom.set_attribute(control, "title", title),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlBinding {
    pub control: NodeId,
    pub action: Action,
    pub ready: ControlLabel,
    pub busy: ControlLabel,
}

#[derive(Debug)]
pub enum Outcome {
    Succeeded,
    Failed(ActionError),
    /// The control was already busy (or gone); nothing ran, nothing reported.
    Ignored,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }
}

/// Validated inputs, gathered before the control goes busy.
enum Prepared<'a> {
    Copy {
        server_id: &'a str,
        backup_uuid: &'a str,
    },
    Schedule {
        dialog: NodeId,
        text: String,
        timezone_offset: &'a str,
    },
}

pub struct ActionExecutor {
    panel: PanelApi,
    schedule: ScheduleTranslator,
}

impl ActionExecutor {
    pub fn new(panel: PanelApi, schedule: ScheduleTranslator) -> Self {
        Self { panel, schedule }
    }

    /// Run the control's action and report exactly one outcome to the host's
    /// notification channel. The control is back in its ready state on return,
    /// whatever happened in between.
    pub fn execute<H: Host>(
        &self,
        binding: &ControlBinding,
        host: &mut H,
        transport: &dyn Transport,
        clock: &dyn Clock,
    ) -> Outcome {
        match host.attribute(binding.control, "disabled") {
            Ok(Some(_)) => {
                debug!(control = %binding.control, "control busy, click ignored");
                return Outcome::Ignored;
            }
            Ok(None) => {}
            Err(e) => {
                debug!(control = %binding.control, error = %e, "control unavailable, click ignored");
                return Outcome::Ignored;
            }
        }

        let kind = binding.action.kind();
        let result = match prepare(&binding.action, host) {
            Ok(prepared) => {
                let result = mark_busy(host, binding)
                    .map_err(ActionError::from)
                    .and_then(|_| self.dispatch(prepared, host, transport));
                restore(host, binding);
                result
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(action = ?kind, "action succeeded");
                host.notify(Notification::success(kind.success_message(), clock.now()));
                Outcome::Succeeded
            }
            Err(e) => {
                warn!(action = ?kind, error = %e, "action failed");
                host.notify(Notification::error(kind.failure_message(&e), clock.now()));
                Outcome::Failed(e)
            }
        }
    }

    fn dispatch<H: Host>(
        &self,
        prepared: Prepared<'_>,
        host: &mut H,
        transport: &dyn Transport,
    ) -> Result<(), ActionError> {
        match prepared {
            Prepared::Copy {
                server_id,
                backup_uuid,
            } => {
                let url = self
                    .panel
                    .resolve_download_url(transport, server_id, backup_uuid)?;
                host.write_text(&url)?;
                Ok(())
            }
            Prepared::Schedule {
                dialog,
                text,
                timezone_offset,
            } => {
                let fields = self.schedule.translate(transport, &text, timezone_offset)?;
                let mut targets = Vec::with_capacity(5);
                for (id, value) in fields.form_values() {
                    let control = host
                        .query_all(Some(dialog), &format!("#{}", id))?
                        .into_iter()
                        .next()
                        .ok_or(ActionError::MissingControl(id))?;
                    targets.push((control, value));
                }
                for (control, value) in targets {
                    host.set_bound_value(control, value)?;
                }
                debug!(expression = %fields.expression(), "schedule fields written");
                Ok(())
            }
        }
    }
}

fn prepare<'a, H: Host>(action: &'a Action, host: &mut H) -> Result<Prepared<'a>, ActionError> {
    match action {
        Action::CopyBackupUrl {
            server_id,
            backup_uuid,
        } => Ok(Prepared::Copy {
            server_id,
            backup_uuid,
        }),
        Action::GenerateSchedule {
            dialog,
            input,
            timezone_offset,
        } => {
            let text = host.value(*input)?.trim().to_string();
            if text.is_empty() {
                return Err(ActionError::EmptyInput);
            }
            Ok(Prepared::Schedule {
                dialog: *dialog,
                text,
                timezone_offset,
            })
        }
    }
}

fn mark_busy<D: HostDom + ?Sized>(dom: &mut D, binding: &ControlBinding) -> Result<(), DomError> {
    dom.set_attribute(binding.control, "disabled", "")?;
    binding.busy.apply(dom, binding.control)
}

fn restore<D: HostDom + ?Sized>(dom: &mut D, binding: &ControlBinding) {
    let restored = dom
        .remove_attribute(binding.control, "disabled")
        .and_then(|_| binding.ready.apply(dom, binding.control));
    if let Err(e) = restored {
        debug!(control = %binding.control, error = %e, "could not restore control");
    }
}
