use std::time::Duration;

use pretty_assertions::assert_eq;

use panel_augment::action::executor::Outcome;
use panel_augment::api::panel::PanelApi;
use panel_augment::api::schedule::ScheduleTranslator;
use panel_augment::dom::clock::ManualClock;
use panel_augment::dom::host::HostDom;
use panel_augment::dom::memory::MemoryHost;
use panel_augment::notify::Severity;
use panel_augment::runtime::{Runtime, RuntimeSettings, Services};
use panel_augment::signal::events::HostEvent;
use panel_augment::signal::navigation::History;
use panel_augment::view::view_model::{BackupKind, View};

use crate::common::fakes::ScriptedTransport;
use crate::common::{LISTING, backups_path, files_path, fixture, t0};

mod common;

const DOWNLOAD: &str =
    r#"{"object":"signed_url","attributes":{"url":"https://cdn.example.com/a.tar.gz"}}"#;

struct Harness {
    runtime: Runtime<MemoryHost>,
    transport: ScriptedTransport,
    clock: ManualClock,
}

fn harness(host: MemoryHost, transport: ScriptedTransport) -> Harness {
    let clock = ManualClock::new(t0());
    let services = Services {
        panel: PanelApi::new("https://panel.example.com", "tok"),
        schedule: ScheduleTranslator::new("https://cron.example.com/"),
        transport: Box::new(transport.clone()),
        clock: Box::new(clock.clone()),
    };
    Harness {
        runtime: Runtime::new(host, services, RuntimeSettings::default()),
        transport,
        clock,
    }
}

fn panel_transport() -> ScriptedTransport {
    ScriptedTransport::new()
        .respond("/backups", 200, LISTING)
        .respond("/system-backups", 200, r#"{"data":[]}"#)
        .respond("/download", 200, DOWNLOAD)
}

/// Started on the user backups page with its own mutations settled.
fn on_backups() -> Harness {
    let host = MemoryHost::from_html(&backups_path(), &fixture("backups_user.html"));
    let mut h = harness(host, panel_transport());
    h.runtime.start().unwrap();
    h.runtime.pump().unwrap();
    h
}

fn listing_fetches(transport: &ScriptedTransport) -> usize {
    transport
        .requests()
        .iter()
        .filter(|r| r.url.ends_with("/backups") || r.url.ends_with("/system-backups"))
        .count()
}

// ============================================================================
// Startup
// ============================================================================

#[test]
fn start_evaluates_immediately() {
    let host = MemoryHost::from_html(&backups_path(), &fixture("backups_user.html"));
    let mut h = harness(host, panel_transport());

    let report = h.runtime.start().unwrap().unwrap();

    assert_eq!(report.view, Some(View::Backups(BackupKind::User)));
    assert_eq!(report.injected, 2);
    assert_eq!(h.runtime.host_mut().count(".copy-url-button"), 2);
    assert_eq!(listing_fetches(&h.transport), 1);
}

#[test]
fn own_mutations_cost_one_quiet_evaluation() {
    let host = MemoryHost::from_html(&backups_path(), &fixture("backups_user.html"));
    let mut h = harness(host, panel_transport());
    h.runtime.start().unwrap();

    let echo = h.runtime.pump().unwrap().unwrap();
    assert_eq!(echo.touched(), 0);
    assert_eq!(echo.unchanged, 2);

    assert!(h.runtime.pump().unwrap().is_none());
    assert_eq!(h.runtime.stats().settles, 2);
    assert_eq!(h.runtime.host_mut().count(".copy-url-button"), 2);
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn push_and_render_burst_settle_once() {
    let mut h = on_backups();
    let settles = h.runtime.stats().settles;

    h.runtime.history().push_state("/server/1a2b3c4d/files?dir=%2F");
    h.runtime
        .host_mut()
        .replace_body(&fixture("files.html"))
        .unwrap();

    let report = h.runtime.pump().unwrap().unwrap();

    assert_eq!(h.runtime.stats().settles, settles + 1);
    assert!(report.activated);
    assert_eq!(report.view, Some(View::Files));
    assert_eq!(report.updated, 3);
    assert_eq!(h.runtime.engine().controls().count(), 0);
    assert_eq!(listing_fetches(&h.transport), 1);
}

#[test]
fn popstate_back_to_backups_refetches() {
    let mut h = on_backups();
    h.runtime.history().push_state(&files_path());
    h.runtime
        .host_mut()
        .replace_body(&fixture("files.html"))
        .unwrap();
    h.runtime.pump().unwrap();
    h.runtime.pump().unwrap();

    h.runtime.host_mut().pop_state(&backups_path());
    h.runtime
        .host_mut()
        .replace_body(&fixture("backups_user.html"))
        .unwrap();
    let report = h.runtime.pump().unwrap().unwrap();

    assert!(report.activated);
    assert_eq!(report.injected, 2);
    assert_eq!(listing_fetches(&h.transport), 2);
    assert_eq!(h.runtime.host_mut().count(".copy-url-button"), 2);
}

#[test]
fn a_full_reload_is_survived_and_re_evaluated() {
    let mut h = on_backups();
    h.runtime
        .host_mut()
        .reload(&backups_path(), &fixture("backups_user.html"));

    assert!(h.runtime.pump().unwrap().is_none());
    assert!(!h.runtime.is_closed());
    assert_eq!(h.runtime.host_mut().count(".copy-url-button"), 0);

    let report = h.runtime.pump().unwrap().unwrap();
    assert!(report.activated);
    assert_eq!(report.injected, 2);
    assert_eq!(listing_fetches(&h.transport), 2);
    assert_eq!(h.runtime.host_mut().count(".copy-url-button"), 2);
    assert_eq!(h.runtime.engine().controls().count(), 2);
}

#[test]
fn heading_change_alone_is_a_navigation() {
    let mut h = on_backups();

    // Same path, new heading: the host swapped tabs without touching history.
    h.runtime
        .host_mut()
        .replace_body(&fixture("backups_system.html"))
        .unwrap();
    h.clock.advance(Duration::from_millis(600));
    let report = h.runtime.pump().unwrap().unwrap();

    assert!(report.activated);
    assert_eq!(report.view, Some(View::Backups(BackupKind::System)));
    assert!(
        h.transport
            .requests()
            .last()
            .unwrap()
            .url
            .ends_with("/servers/1a2b3c4d/system-backups")
    );
    assert_eq!(h.runtime.host_mut().count(".system-backup-note"), 1);

    // The poll was primed by the settle; nothing fires again.
    h.clock.advance(Duration::from_millis(600));
    h.runtime.pump().unwrap();
    h.clock.advance(Duration::from_millis(600));
    assert!(h.runtime.pump().unwrap().is_none());
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn click_event_runs_the_bound_action() {
    let mut h = on_backups();
    let button = h.runtime.host_mut().find("#card-b .copy-url-button").unwrap()[0];

    h.runtime
        .host_mut()
        .queue_event(HostEvent::Click { node: button });
    h.runtime.pump().unwrap();

    assert_eq!(h.runtime.stats().clicks, 1);
    assert_eq!(h.runtime.host().clipboard(), &["https://cdn.example.com/a.tar.gz".to_string()]);
    assert!(h.transport.count("/backups/uuid-b/download") == 1);
    let last = h.runtime.host().notifications().last().unwrap();
    assert_eq!(last.severity, Severity::Success);
}

#[test]
fn clicks_on_host_elements_are_not_ours() {
    let mut h = on_backups();
    let trash = h.runtime.host_mut().find("#delete-a").unwrap()[0];

    assert!(h.runtime.click(trash).is_none());
    assert!(h.runtime.handle(HostEvent::Click { node: trash }).unwrap().is_none());
    assert_eq!(h.runtime.stats().clicks, 0);
}

#[test]
fn second_click_while_busy_is_ignored() {
    let mut h = on_backups();
    let button = h.runtime.host_mut().find("#card-a .copy-url-button").unwrap()[0];
    h.runtime
        .host_mut()
        .set_attribute(button, "disabled", "")
        .unwrap();

    let outcome = h.runtime.click(button).unwrap();

    assert!(matches!(outcome, Outcome::Ignored));
    assert_eq!(h.runtime.stats().ignored_clicks, 1);
    assert_eq!(h.transport.count("/download"), 0);
}

#[test]
fn unload_stops_the_loop() {
    let mut h = on_backups();
    h.runtime.host_mut().queue_event(HostEvent::Unload);

    h.runtime.run_until_closed(Duration::from_millis(50)).unwrap();

    assert!(h.runtime.is_closed());
    h.runtime
        .host_mut()
        .queue_event(HostEvent::Mutations { count: 4 });
    assert!(h.runtime.pump().unwrap().is_none());
}

#[test]
fn without_idle_support_settles_inline() {
    let host = MemoryHost::from_html(&files_path(), &fixture("files.html")).without_idle();
    let mut h = harness(host, panel_transport());
    h.runtime.start().unwrap();
    let settles = h.runtime.stats().settles;

    h.runtime
        .handle(HostEvent::Mutations { count: 7 })
        .unwrap();
    assert_eq!(h.runtime.stats().settles, settles + 1);
    assert!(!h.runtime.gate().is_scheduled());

    // Idle again, so the next batch settles on its own.
    h.runtime
        .handle(HostEvent::Mutations { count: 1 })
        .unwrap();
    assert_eq!(h.runtime.stats().settles, settles + 2);
}

#[test]
fn listing_failure_is_shown_once_per_activation() {
    let host = MemoryHost::from_html(&backups_path(), &fixture("backups_user.html"));
    let transport = ScriptedTransport::new().respond("/backups", 503, "");
    let mut h = harness(host, transport);

    h.runtime.start().unwrap();
    for _ in 0..3 {
        h.runtime
            .host_mut()
            .queue_event(HostEvent::Mutations { count: 1 });
        h.runtime.pump().unwrap();
    }

    let messages: Vec<&str> = h
        .runtime
        .host()
        .notifications()
        .iter()
        .map(|n| n.message.as_str())
        .collect();
    assert_eq!(messages, vec!["Failed to fetch backups."]);
    assert_eq!(h.runtime.host_mut().count(".copy-url-button"), 0);
}
