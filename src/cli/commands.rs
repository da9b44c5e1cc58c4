use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::api::panel::PanelApi;
use crate::api::schedule::ScheduleTranslator;
use crate::api::transport::{ReqwestTransport, Transport};
use crate::browser::session::BrowserSession;
use crate::cli::config::AppConfig;
use crate::dom::clock::{Clock, SystemClock};
use crate::dom::host::DomError;
use crate::dom::memory::MemoryHost;
use crate::notify::toast::ToastStack;
use crate::runtime::{Runtime, RuntimeSettings, Services};
use crate::trace::logger::TraceLogger;
use crate::view::matcher::{classify_parts, server_id};

/// Delay between loop turns while a live page is open.
const LOOP_IDLE: Duration = Duration::from_millis(50);

fn services(
    config: &AppConfig,
    transport: Box<dyn Transport>,
    clock: Box<dyn Clock>,
) -> Services {
    Services {
        panel: PanelApi::new(
            &config.panel.origin,
            config.panel.api_token.as_deref().unwrap_or_default(),
        ),
        schedule: ScheduleTranslator::new(&config.schedule.endpoint),
        transport,
        clock,
    }
}

// ============================================================================
// run subcommand
// ============================================================================

pub fn cmd_run(
    config: &AppConfig,
    url: &str,
    bridge: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let script = bridge.unwrap_or(config.bridge.script.as_path());
    let mut session =
        BrowserSession::launch(script)?.with_toast_duration(config.timing.toast_duration());
    session.navigate(url)?;
    session.install_hooks()?;
    info!(url, "page open, augmenting");

    let transport = ReqwestTransport::new(config.timing.request_timeout())?;
    let mut runtime = Runtime::new(
        session,
        services(config, Box::new(transport), Box::new(SystemClock)),
        config.timing.runtime_settings(),
    )
    .with_tracer(TraceLogger::new(&config.trace.file));

    runtime.start()?;
    runtime.run_until_closed(LOOP_IDLE)?;

    let stats = runtime.stats();
    println!(
        "Page closed after {} evaluations ({} settles, {} clicks)",
        runtime.engine().evaluations(),
        stats.settles,
        stats.clicks
    );
    Ok(())
}

// ============================================================================
// replay subcommand
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub view: String,
    pub server_id: Option<String>,
    pub injected: usize,
    pub updated: usize,
    pub skipped_unresolved: usize,
    pub degraded: usize,
    pub controls: usize,
    pub notifications: Vec<String>,
}

/// Augment one HTML snapshot as if it had just been navigated to.
/// Returns the summary and the augmented document.
pub fn replay_document(
    html: &str,
    path: &str,
    services: Services,
    settings: RuntimeSettings,
    toast_duration: Duration,
) -> Result<(ReplaySummary, String), DomError> {
    let host = MemoryHost::from_html(path, html).with_toasts(ToastStack::new(toast_duration));
    let mut runtime = Runtime::new(host, services, settings);

    let mut summary = ReplaySummary {
        view: "none".into(),
        server_id: server_id(path).map(str::to_string),
        injected: 0,
        updated: 0,
        skipped_unresolved: 0,
        degraded: 0,
        controls: 0,
        notifications: Vec::new(),
    };
    if let Some(report) = runtime.start()? {
        if let Some(view) = report.view {
            summary.view = view.tag().to_string();
        }
        summary.injected = report.injected;
        summary.updated = report.updated;
        summary.skipped_unresolved = report.skipped_unresolved;
        summary.degraded = report.degraded;
    }
    // Let the evaluation's own mutations settle.
    runtime.pump()?;

    summary.controls = runtime.engine().controls().count();
    summary.notifications = runtime
        .host()
        .notifications()
        .iter()
        .map(|n| n.display_text())
        .collect();
    Ok((summary, runtime.host().html()))
}

pub fn cmd_replay(
    config: &AppConfig,
    fixture: &Path,
    path: &str,
    output: Option<&Path>,
) -> Result<ReplaySummary, Box<dyn std::error::Error>> {
    let html = std::fs::read_to_string(fixture)?;
    let transport = ReqwestTransport::new(config.timing.request_timeout())?;
    let (summary, document) = replay_document(
        &html,
        path,
        services(config, Box::new(transport), Box::new(SystemClock)),
        config.timing.runtime_settings(),
        config.timing.toast_duration(),
    )?;

    println!("View:        {}", summary.view);
    println!("Injected:    {}", summary.injected);
    println!("Updated:     {}", summary.updated);
    println!("Unresolved:  {}", summary.skipped_unresolved);
    if summary.degraded > 0 {
        println!("Degraded:    {}", summary.degraded);
    }
    for notification in &summary.notifications {
        println!("  {}", notification);
    }

    if let Some(output) = output {
        std::fs::write(output, document)?;
        println!("Augmented document written to {}", output.display());
    }
    Ok(summary)
}

// ============================================================================
// classify subcommand
// ============================================================================

pub fn cmd_classify(path: &str, headings: &[String]) -> String {
    let view = classify_parts(path, headings);
    match server_id(path) {
        Some(id) => format!("{} (server {})", view.tag(), id),
        None => view.tag().to_string(),
    }
}
