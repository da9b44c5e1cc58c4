use std::path::Path;
use std::time::Duration;

use panel_augment::browser::session::{
    BridgeRequest, BridgeResponse, BrowserSession, SessionError, toast_request,
};
use panel_augment::dom::host::{DomError, NodeId, Placement};
use panel_augment::notify::Notification;
use panel_augment::signal::events::HostEvent;
use panel_augment::signal::navigation::NavSource;
use serde_json::json;

use crate::common::t0;

mod common;

// =========================================================================
// BridgeRequest serialization
// =========================================================================

fn to_value(request: &BridgeRequest<'_>) -> serde_json::Value {
    serde_json::to_value(request).unwrap()
}

#[test]
fn bridge_request_navigate_serializes_correctly() {
    let req = BridgeRequest::Navigate {
        url: "https://panel.example.com/server/abc/backups",
    };
    assert_eq!(
        to_value(&req),
        json!({"cmd": "navigate", "url": "https://panel.example.com/server/abc/backups"})
    );
}

#[test]
fn bridge_request_unit_commands_carry_only_the_tag() {
    assert_eq!(to_value(&BridgeRequest::InstallHooks), json!({"cmd": "install_hooks"}));
    assert_eq!(to_value(&BridgeRequest::Events), json!({"cmd": "events"}));
    assert_eq!(to_value(&BridgeRequest::Location), json!({"cmd": "location"}));
    assert_eq!(to_value(&BridgeRequest::Quit), json!({"cmd": "quit"}));
}

#[test]
fn bridge_request_query_all_scoped_and_unscoped() {
    let unscoped = BridgeRequest::QueryAll {
        scope: None,
        selector: ".card-body",
    };
    assert_eq!(
        to_value(&unscoped),
        json!({"cmd": "query_all", "scope": null, "selector": ".card-body"})
    );

    let scoped = BridgeRequest::QueryAll {
        scope: Some(NodeId(7)),
        selector: "span.font-mono",
    };
    assert_eq!(
        to_value(&scoped),
        json!({"cmd": "query_all", "scope": 7, "selector": "span.font-mono"})
    );
}

#[test]
fn bridge_request_insert_serializes_placement() {
    let req = BridgeRequest::Insert {
        html: "<button>x</button>",
        placement: Placement::After(NodeId(12)),
    };
    assert_eq!(
        to_value(&req),
        json!({
            "cmd": "insert",
            "html": "<button>x</button>",
            "placement": {"kind": "after", "node": 12}
        })
    );

    let append = serde_json::to_value(Placement::Append(NodeId(3))).unwrap();
    assert_eq!(append, json!({"kind": "append", "node": 3}));
}

#[test]
fn bridge_request_attribute_commands() {
    let set = BridgeRequest::SetAttr {
        node: NodeId(4),
        name: "disabled",
        value: "",
    };
    assert_eq!(
        to_value(&set),
        json!({"cmd": "set_attr", "node": 4, "name": "disabled", "value": ""})
    );

    let bound = BridgeRequest::SetBoundValue {
        node: NodeId(9),
        value: "*/5",
    };
    assert_eq!(
        to_value(&bound),
        json!({"cmd": "set_bound_value", "node": 9, "value": "*/5"})
    );
}

#[test]
fn toast_request_carries_the_configured_duration() {
    let notification = Notification::error("Failed to fetch backups.", t0());
    let req = toast_request(&notification, Duration::from_millis(8000));
    assert_eq!(
        to_value(&req),
        json!({
            "cmd": "toast",
            "severity": "error",
            "message": "Failed to fetch backups.",
            "duration_ms": 8000
        })
    );
}

// =========================================================================
// BridgeResponse deserialization
// =========================================================================

#[test]
fn bridge_response_deserializes_ready_signal() {
    let resp: BridgeResponse = serde_json::from_str(r#"{"ok":true,"ready":true}"#).unwrap();
    assert!(resp.ok);
    assert_eq!(resp.ready, Some(true));
    assert!(resp.error.is_none());
}

#[test]
fn bridge_response_deserializes_error_kind() {
    let json = r#"{"ok":false,"error":"node 4 is gone","error_kind":"detached"}"#;
    let resp: BridgeResponse = serde_json::from_str(json).unwrap();
    assert!(!resp.ok);
    assert_eq!(resp.error.as_deref(), Some("node 4 is gone"));
    assert_eq!(resp.error_kind.as_deref(), Some("detached"));
}

#[test]
fn bridge_response_deserializes_nodes_and_text() {
    let resp: BridgeResponse = serde_json::from_str(r#"{"ok":true,"nodes":[1,2,5]}"#).unwrap();
    assert_eq!(resp.nodes, Some(vec![NodeId(1), NodeId(2), NodeId(5)]));

    let resp: BridgeResponse = serde_json::from_str(r#"{"ok":true,"node":null}"#).unwrap();
    assert!(resp.node.is_none());

    let resp: BridgeResponse = serde_json::from_str(r#"{"ok":true,"text":"User Backups"}"#).unwrap();
    assert_eq!(resp.text.as_deref(), Some("User Backups"));
}

#[test]
fn bridge_response_deserializes_page_events() {
    let json = r#"{"ok":true,"events":[
        {"type":"navigation","source":"push"},
        {"type":"navigation","source":"pop_state"},
        {"type":"navigation","source":"reload"},
        {"type":"click","node":14},
        {"type":"mutations","count":23},
        {"type":"unload"}
    ]}"#;
    let resp: BridgeResponse = serde_json::from_str(json).unwrap();
    assert_eq!(
        resp.events.unwrap(),
        vec![
            HostEvent::Navigation {
                source: NavSource::Push
            },
            HostEvent::Navigation {
                source: NavSource::PopState
            },
            HostEvent::Navigation {
                source: NavSource::Reload
            },
            HostEvent::Click { node: NodeId(14) },
            HostEvent::Mutations { count: 23 },
            HostEvent::Unload,
        ]
    );
}

// =========================================================================
// Session errors
// =========================================================================

#[test]
fn session_error_messages() {
    let protocol = SessionError::Protocol {
        command: "insert",
        kind: Some("detached".into()),
        error: "node 4 is gone".into(),
    };
    assert_eq!(protocol.to_string(), "bridge command 'insert' failed: node 4 is gone");
    assert_eq!(
        SessionError::Io("broken pipe".into()).to_string(),
        "bridge I/O: broken pipe"
    );
}

fn protocol(kind: Option<&str>) -> SessionError {
    SessionError::Protocol {
        command: "text",
        kind: kind.map(str::to_string),
        error: "failed".into(),
    }
}

#[test]
fn bridge_error_kinds_map_to_page_errors() {
    assert!(matches!(
        protocol(Some("detached")).into_dom(Some(NodeId(4)), None),
        DomError::Detached(NodeId(4))
    ));
    assert!(matches!(
        protocol(Some("selector")).into_dom(None, Some("div[")),
        DomError::Selector { .. }
    ));
    assert!(matches!(protocol(None).into_dom(None, None), DomError::Bridge(_)));
}

#[test]
fn a_document_replaced_mid_command_is_not_a_bridge_failure() {
    let error = protocol(Some("replaced")).into_dom(Some(NodeId(4)), None);
    assert!(matches!(error, DomError::Replaced));
    assert!(error.is_fatal());
    assert!(!error.is_detached());
}

#[test]
fn launch_without_a_bridge_script_fails() {
    let result = BrowserSession::launch(Path::new("/nonexistent/panel_bridge.js"));
    assert!(result.is_err());
}
