use std::collections::{HashMap, HashSet};

use tracing::{debug, info, trace, warn};

use crate::action::executor::ControlBinding;
use crate::correlate::correlator::{Correlator, ListingSource};
use crate::correlate::index::{ActivationId, CorrelationIndex, EmptyReason, IndexState};
use crate::dom::clock::Clock;
use crate::dom::host::{DomError, HostDom, NodeId};
use crate::inject::feature::{AnchorState, ApplyContext, Feature};
use crate::inject::marks::{Mark, ProcessedMarks};
use crate::notify::Notification;
use crate::signal::navigation::NavSource;
use crate::view::matcher::{Classification, ViewMatcher};
use crate::view::view_model::{BackupKind, View};

// ============================================================================
// Activation
// ============================================================================

/// The view the engine is currently working against.
#[derive(Debug, Clone)]
pub struct Activation {
    pub id: ActivationId,
    pub view: View,
    pub path: String,
    pub server_id: Option<String>,
    pub heading_timed_out: bool,
    index: Option<CorrelationIndex>,
    failure_reported: bool,
}

impl Activation {
    fn new(id: ActivationId, classification: Classification) -> Self {
        let server_id = classification.server_id().map(str::to_string);
        Self {
            id,
            view: classification.view,
            path: classification.path,
            server_id,
            heading_timed_out: classification.heading_timed_out,
            index: None,
            failure_reported: false,
        }
    }

    pub fn index(&self) -> Option<&CorrelationIndex> {
        self.index.as_ref()
    }
}

// ============================================================================
// Report
// ============================================================================

/// What one `reevaluate` call did.
#[derive(Debug, Clone, Default)]
pub struct EvaluationReport {
    pub evaluation: u64,
    pub activation: Option<ActivationId>,
    pub view: Option<View>,
    /// A new activation started with this call.
    pub activated: bool,
    /// Fragments inserted.
    pub injected: usize,
    /// Anchors rewritten in place, or re-injected after a token change.
    pub updated: usize,
    /// Anchors skipped because their mark is current.
    pub unchanged: usize,
    pub skipped_unresolved: usize,
    /// Anchors with no insertion point; retried on the next call.
    pub deferred: usize,
    pub degraded: usize,
    pub index_state: Option<IndexState>,
    /// User-facing messages raised by this call.
    pub notifications: Vec<Notification>,
}

impl EvaluationReport {
    pub fn touched(&self) -> usize {
        self.injected + self.updated
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Walks the anchors of the active view and brings every one of them up to
/// date, exactly once per version token.
///
/// `reevaluate` takes `&mut self`, so overlapping calls cannot exist; repeated
/// calls with an unchanged page are no-ops thanks to the processed marks.
pub struct InjectionEngine {
    matcher: ViewMatcher,
    correlator: Correlator,
    features: Vec<Box<dyn Feature>>,
    marks: ProcessedMarks,
    controls: HashMap<NodeId, ControlBinding>,
    installed: HashSet<&'static str>,
    activation: Option<Activation>,
    next_activation: u64,
    evaluations: u64,
}

impl InjectionEngine {
    pub fn new(matcher: ViewMatcher, features: Vec<Box<dyn Feature>>) -> Self {
        Self {
            matcher,
            correlator: Correlator::new(),
            features,
            marks: ProcessedMarks::default(),
            controls: HashMap::new(),
            installed: HashSet::new(),
            activation: None,
            next_activation: 0,
            evaluations: 0,
        }
    }

    pub fn activation(&self) -> Option<&Activation> {
        self.activation.as_ref()
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn marks(&self) -> &ProcessedMarks {
        &self.marks
    }

    /// The action wired to an injected control, if it is one of ours.
    pub fn binding(&self, control: NodeId) -> Option<&ControlBinding> {
        self.controls.get(&control)
    }

    pub fn controls(&self) -> impl Iterator<Item = &ControlBinding> {
        self.controls.values()
    }

    /// Bring the page up to date.
    ///
    /// A navigation, a first call, or a path change starts a new activation:
    /// the view is re-classified and correlated data is fetched again. Only
    /// host bridge failures are returned; everything else is logged and folded
    /// into the report.
    pub fn reevaluate(
        &mut self,
        dom: &mut dyn HostDom,
        clock: &dyn Clock,
        listing: &dyn ListingSource,
        navigation: Option<NavSource>,
    ) -> Result<EvaluationReport, DomError> {
        self.evaluations += 1;
        let mut report = EvaluationReport {
            evaluation: self.evaluations,
            ..Default::default()
        };

        if navigation == Some(NavSource::Reload) {
            // A fresh document carries none of our page-level setup.
            self.installed.clear();
        }

        let path = dom.location_path()?;
        let stale = match &self.activation {
            None => true,
            Some(current) => navigation.is_some() || current.path != path,
        };
        if stale {
            let classification = self.matcher.classify(dom, clock)?;
            self.next_activation += 1;
            let id = ActivationId(self.next_activation);
            self.correlator.activate(id);
            info!(
                %id,
                view = %classification.view,
                path = %classification.path,
                trigger = ?navigation,
                "view activated"
            );
            self.activation = Some(Activation::new(id, classification));
            report.activated = true;
        }

        let Some(activation) = self.activation.as_mut() else {
            return Ok(report);
        };
        report.activation = Some(activation.id);
        report.view = Some(activation.view);

        if let View::Backups(kind) = activation.view {
            ensure_index(&self.correlator, activation, kind, listing, clock, &mut report);
        }
        report.index_state = activation.index.as_ref().map(|i| i.state().clone());

        self.marks.prune(dom)?;
        let mut gone = Vec::new();
        for control in self.controls.keys() {
            if !dom.is_connected(*control)? {
                gone.push(*control);
            }
        }
        for control in gone {
            self.controls.remove(&control);
        }

        let view = activation.view;
        if !view.is_of_interest() {
            trace!(evaluation = report.evaluation, "nothing to do on this view");
            return Ok(report);
        }

        let activation = activation.clone();
        let mut scan = Scan {
            marks: &mut self.marks,
            controls: &mut self.controls,
            report: &mut report,
            clock,
            activation: &activation,
        };
        for feature in &self.features {
            if !feature.applies_to(view) {
                continue;
            }
            if self.installed.insert(feature.name()) {
                if let Err(e) = feature.install(dom) {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    warn!(feature = feature.name(), error = %e, "feature setup failed");
                }
            }

            let anchors = match dom.query_all(None, feature.anchor_selector()) {
                Ok(anchors) => anchors,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(feature = feature.name(), error = %e, "anchor scan failed");
                    continue;
                }
            };

            for anchor in anchors {
                match scan.process(feature.as_ref(), dom, anchor) {
                    Ok(()) => {}
                    Err(e) if e.is_detached() => {
                        debug!(feature = feature.name(), %anchor, "anchor went away mid-evaluation");
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(feature = feature.name(), %anchor, error = %e, "could not process anchor");
                    }
                }
            }
        }

        debug!(
            evaluation = report.evaluation,
            view = %view,
            injected = report.injected,
            updated = report.updated,
            unchanged = report.unchanged,
            unresolved = report.skipped_unresolved,
            "evaluation finished"
        );
        Ok(report)
    }
}

/// Fetch the listing once per activation.
fn ensure_index(
    correlator: &Correlator,
    activation: &mut Activation,
    kind: BackupKind,
    listing: &dyn ListingSource,
    clock: &dyn Clock,
    report: &mut EvaluationReport,
) {
    if activation.index.is_some() {
        return;
    }
    let built = correlator.build(activation.id, activation.server_id.as_deref(), kind, listing);
    let Some(index) = correlator.accept(built) else {
        return;
    };

    if let IndexState::Empty { reason } = index.state() {
        let message = match reason {
            EmptyReason::MissingServer => None,
            EmptyReason::Upstream { .. } | EmptyReason::Network { .. } => {
                Some("Failed to fetch backups.")
            }
            EmptyReason::Malformed { .. } => Some("Failed to parse backup listing."),
        };
        if let Some(message) = message {
            if !activation.failure_reported {
                activation.failure_reported = true;
                report.notifications.push(Notification::error(message, clock.now()));
            }
        }
    }
    activation.index = Some(index);
}

/// Per-call state shared by every anchor of one evaluation.
struct Scan<'a> {
    marks: &'a mut ProcessedMarks,
    controls: &'a mut HashMap<NodeId, ControlBinding>,
    report: &'a mut EvaluationReport,
    clock: &'a dyn Clock,
    activation: &'a Activation,
}

impl Scan<'_> {
    fn process(&mut self, feature: &dyn Feature, dom: &mut dyn HostDom, anchor: NodeId) -> Result<(), DomError> {
        let name = feature.name();
        let Some(state) = feature.inspect(dom, anchor)? else {
            return Ok(());
        };
        if self.marks.is_current(dom, name, anchor, &state.token)? {
            self.report.unchanged += 1;
            return Ok(());
        }

        let resolved = match resolve(feature, self.activation, &state) {
            Resolution::NotNeeded => None,
            Resolution::Resolved(id) => Some(id),
            Resolution::Unresolved => {
                trace!(feature = name, %anchor, key = ?state.key, "key not in index");
                self.report.skipped_unresolved += 1;
                return Ok(());
            }
        };

        // A token change replaces whatever we put there before.
        let previous = self.marks.get(name, anchor).cloned();
        if let Some(Mark {
            fragment: Some(old), ..
        }) = &previous
        {
            self.controls.retain(|_, b| b.control != *old);
            match dom.remove(*old) {
                Ok(()) => {}
                Err(e) if e.is_detached() => {}
                Err(e) => return Err(e),
            }
        }

        let cx = ApplyContext {
            clock: self.clock,
            server_id: self.activation.server_id.as_deref(),
            resolved,
        };
        let Some(applied) = feature.apply(dom, anchor, &state, &cx)? else {
            self.report.deferred += 1;
            return Ok(());
        };

        match applied.fragment {
            Some(_) if previous.is_none() => self.report.injected += 1,
            _ => self.report.updated += 1,
        }
        if applied.degraded {
            self.report.degraded += 1;
        }
        if let Some(binding) = applied.binding {
            self.controls.insert(binding.control, binding);
        }
        self.marks.set(
            name,
            anchor,
            Mark {
                token: state.token,
                fragment: applied.fragment,
            },
        );
        Ok(())
    }
}

enum Resolution<'a> {
    NotNeeded,
    Resolved(&'a str),
    Unresolved,
}

fn resolve<'a>(feature: &dyn Feature, activation: &'a Activation, state: &AnchorState) -> Resolution<'a> {
    if !feature.requires_resolution() {
        return Resolution::NotNeeded;
    }
    let found = match (&activation.index, &state.key) {
        (Some(index), Some(key)) => index.resolve(key),
        _ => None,
    };
    match found {
        Some(id) => Resolution::Resolved(id),
        None => Resolution::Unresolved,
    }
}
