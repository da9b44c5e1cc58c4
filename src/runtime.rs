use std::time::Duration;

use tracing::{debug, info};

use crate::action::executor::{ActionExecutor, Outcome};
use crate::api::panel::{PanelApi, PanelListing};
use crate::api::schedule::ScheduleTranslator;
use crate::api::transport::Transport;
use crate::dom::clock::Clock;
use crate::dom::host::{DomError, Host, NodeId};
use crate::inject::engine::{EvaluationReport, InjectionEngine};
use crate::inject::feature::Feature;
use crate::inject::features;
use crate::signal::events::{EventSource, HostEvent};
use crate::signal::gate::MutationGate;
use crate::signal::navigation::{History, InterceptedHistory, NavSource, NavigationSignal};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;
use crate::view::matcher::ViewMatcher;

/// Remote collaborators and time.
pub struct Services {
    pub panel: PanelApi,
    pub schedule: ScheduleTranslator,
    pub transport: Box<dyn Transport>,
    pub clock: Box<dyn Clock>,
}

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub matcher: ViewMatcher,
    pub poll_interval: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            matcher: ViewMatcher::default(),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub settles: u64,
    pub clicks: u64,
    pub ignored_clicks: u64,
}

/// The page-lifetime event loop.
///
/// Every trigger (history calls, popstate, the heading poll, mutation
/// batches) goes through one `MutationGate`, and each `pump` runs at most one
/// settled evaluation.
pub struct Runtime<H> {
    host: H,
    engine: InjectionEngine,
    gate: MutationGate,
    navigation: NavigationSignal,
    executor: ActionExecutor,
    panel: PanelApi,
    transport: Box<dyn Transport>,
    clock: Box<dyn Clock>,
    tracer: TraceLogger,
    stats: RuntimeStats,
    closed: bool,
}

impl<H: Host + EventSource> Runtime<H> {
    pub fn new(host: H, services: Services, settings: RuntimeSettings) -> Self {
        Self::with_features(host, services, settings, features::all())
    }

    pub fn with_features(
        host: H,
        services: Services,
        settings: RuntimeSettings,
        features: Vec<Box<dyn Feature>>,
    ) -> Self {
        let Services {
            panel,
            schedule,
            transport,
            clock,
        } = services;
        Self {
            host,
            engine: InjectionEngine::new(settings.matcher, features),
            gate: MutationGate::new(),
            navigation: NavigationSignal::new(settings.poll_interval),
            executor: ActionExecutor::new(panel.clone(), schedule),
            panel,
            transport,
            clock,
            tracer: TraceLogger::disabled(),
            stats: RuntimeStats::default(),
            closed: false,
        }
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&self) -> &InjectionEngine {
        &self.engine
    }

    pub fn gate(&self) -> &MutationGate {
        &self.gate
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Treat page load as the first navigation and evaluate right away.
    pub fn start(&mut self) -> Result<Option<EvaluationReport>, DomError> {
        self.navigation.prime(&mut self.host)?;
        self.gate.on_navigation(NavSource::Startup);
        self.settle()
    }

    /// The host's history with push/replace wrapped to signal navigation.
    pub fn history(&mut self) -> InterceptedHistory<&mut H>
    where
        H: History,
    {
        self.navigation.intercept(&mut self.host)
    }

    /// Feed one host event. Clicks run their action synchronously.
    pub fn handle(&mut self, event: HostEvent) -> Result<Option<Outcome>, DomError> {
        let armed = match event {
            HostEvent::Navigation { source } => self.gate.on_navigation(source),
            HostEvent::Mutations { count } => self.gate.on_mutations(count),
            HostEvent::Click { node } => return Ok(self.click(node)),
            HostEvent::Unload => {
                info!("page unloading");
                self.closed = true;
                false
            }
        };
        // Without an idle facility the evaluation cannot be deferred.
        if armed && !self.host.supports_idle() {
            self.settle()?;
        }
        Ok(None)
    }

    /// One turn of the loop: collect triggers, then run the settled
    /// evaluation if one is pending.
    ///
    /// A document replaced underneath the turn (reload, hard navigation) is
    /// not an error: it counts as a navigation and the next turn evaluates the
    /// new page.
    pub fn pump(&mut self) -> Result<Option<EvaluationReport>, DomError> {
        match self.turn() {
            Err(DomError::Replaced) => {
                info!("document replaced, re-evaluating");
                self.gate.on_navigation(NavSource::Reload);
                Ok(None)
            }
            other => other,
        }
    }

    fn turn(&mut self) -> Result<Option<EvaluationReport>, DomError> {
        if self.closed {
            return Ok(None);
        }
        for source in self.navigation.drain() {
            if self.gate.on_navigation(source) && !self.host.supports_idle() {
                self.settle()?;
            }
        }
        for event in self.host.poll_events()? {
            self.handle(event)?;
            if self.closed {
                return Ok(None);
            }
        }
        if let Some(source) = self.navigation.poll(&mut self.host, self.clock.now())? {
            self.handle(HostEvent::Navigation { source })?;
        }
        self.settle()
    }

    /// Pump until the page unloads, sleeping `idle` between turns.
    pub fn run_until_closed(&mut self, idle: Duration) -> Result<(), DomError> {
        while !self.closed {
            self.pump()?;
            self.clock.sleep(idle);
        }
        Ok(())
    }

    /// Run the action bound to `control`, if it is one of ours.
    pub fn click(&mut self, control: NodeId) -> Option<Outcome> {
        let Some(binding) = self.engine.binding(control).cloned() else {
            debug!(%control, "click on unknown control");
            return None;
        };
        let outcome = self.executor.execute(
            &binding,
            &mut self.host,
            self.transport.as_ref(),
            self.clock.as_ref(),
        );
        self.stats.clicks += 1;
        if matches!(outcome, Outcome::Ignored) {
            self.stats.ignored_clicks += 1;
        }

        let label = match &outcome {
            Outcome::Succeeded => "succeeded".to_string(),
            Outcome::Failed(e) => format!("failed: {}", e),
            Outcome::Ignored => "ignored".to_string(),
        };
        self.tracer.log(
            &TraceEvent::at(self.clock.now(), self.engine.evaluations())
                .with_action(format!("{:?}", binding.action.kind()), label),
        );
        Some(outcome)
    }

    fn settle(&mut self) -> Result<Option<EvaluationReport>, DomError> {
        let Some(settle) = self.gate.pending() else {
            return Ok(None);
        };
        // Re-armed first: mutations we cause below arm the next settle.
        self.gate.complete();
        self.stats.settles += 1;

        let listing = PanelListing {
            api: &self.panel,
            transport: self.transport.as_ref(),
        };
        let report = self.engine.reevaluate(
            &mut self.host,
            self.clock.as_ref(),
            &listing,
            settle.navigation,
        )?;
        if settle.navigation.is_some() {
            self.navigation.prime(&mut self.host)?;
        }

        for notification in &report.notifications {
            self.host.notify(notification.clone());
        }
        self.tracer.log(
            &TraceEvent::at(self.clock.now(), report.evaluation)
                .with_settle(&settle)
                .with_report(&report),
        );
        Ok(Some(report))
    }
}
