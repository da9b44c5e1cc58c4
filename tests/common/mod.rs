#![allow(dead_code)]

pub mod fakes;

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};

pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {}: {}", path.display(), e))
}

/// 2025-03-03 16:00:00 UTC, a Monday afternoon.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 16, 0, 0).unwrap()
}

pub const SERVER: &str = "1a2b3c4d";

pub fn backups_path() -> String {
    format!("/server/{}/backups", SERVER)
}

pub fn files_path() -> String {
    format!("/server/{}/files", SERVER)
}

pub fn schedules_path() -> String {
    format!("/server/{}/schedules", SERVER)
}

pub const LISTING: &str = r#"{
  "object": "list",
  "data": [
    {"object": "backup", "attributes": {"uuid": "uuid-a", "checksum": "restic-snapshot-id:aaa111", "name": "nightly"}},
    {"object": "backup", "attributes": {"uuid": "uuid-b", "checksum": "restic-snapshot-id:bbb222", "name": "weekly"}},
    {"object": "backup", "attributes": {"uuid": "uuid-running", "checksum": null, "name": "in progress"}}
  ]
}"#;
