use pretty_assertions::assert_eq;

use panel_augment::api::panel::PanelApi;
use panel_augment::api::schedule::ScheduleTranslator;
use panel_augment::dom::clock::ManualClock;
use panel_augment::dom::memory::MemoryHost;
use panel_augment::runtime::{Runtime, RuntimeSettings, Services};
use panel_augment::signal::gate::Settle;
use panel_augment::signal::navigation::NavSource;
use panel_augment::trace::logger::TraceLogger;
use panel_augment::trace::trace::TraceEvent;

use crate::common::fakes::ScriptedTransport;
use crate::common::{LISTING, backups_path, fixture, t0};

mod common;

#[test]
fn trace_event_describes_its_trigger() {
    let nav = TraceEvent::at(t0(), 3).with_settle(&Settle {
        navigation: Some(NavSource::PopState),
        coalesced: 4,
    });
    assert_eq!(nav.trigger, "navigation:popstate");
    assert_eq!(nav.timestamp_ms, t0().timestamp_millis());

    let burst = TraceEvent::at(t0(), 4).with_settle(&Settle {
        navigation: None,
        coalesced: 12,
    });
    assert_eq!(burst.trigger, "mutations:12");

    let click = TraceEvent::at(t0(), 4).with_action("CopyBackupUrl", "succeeded");
    assert_eq!(click.trigger, "click");
    assert_eq!(click.outcome.as_deref(), Some("succeeded"));
}

#[test]
fn disabled_logger_writes_nothing() {
    let logger = TraceLogger::disabled();
    assert!(!logger.is_enabled());
    logger.log(&TraceEvent::at(t0(), 1));
}

#[test]
fn runtime_appends_one_line_per_settle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");

    let services = Services {
        panel: PanelApi::new("https://panel.example.com", "tok"),
        schedule: ScheduleTranslator::new("https://cron.example.com/"),
        transport: Box::new(ScriptedTransport::new().respond("/backups", 200, LISTING)),
        clock: Box::new(ManualClock::new(t0())),
    };
    let host = MemoryHost::from_html(&backups_path(), &fixture("backups_user.html"));
    let mut runtime = Runtime::new(host, services, RuntimeSettings::default())
        .with_tracer(TraceLogger::new(&path));

    runtime.start().unwrap();
    runtime.pump().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["trigger"], "navigation:startup");
    assert_eq!(lines[0]["view"], "backups:user");
    assert_eq!(lines[0]["injected"], 2);
    assert_eq!(lines[0]["index_state"]["state"], "populated");
    assert!(lines[1]["trigger"].as_str().unwrap().starts_with("mutations:"));
    assert_eq!(lines[1]["injected"], 0);
}
