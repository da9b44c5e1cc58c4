use chrono::{TimeDelta, TimeZone, Utc};
use pretty_assertions::assert_eq;

use panel_augment::format::time::{
    describe_timestamp, format_absolute, format_offset, ordinal_suffix, parse_datetime,
    relative_age,
};

// ============================================================================
// Relative ages
// ============================================================================

#[test]
fn ages_under_a_minute_count_seconds() {
    assert_eq!(relative_age(0).as_deref(), Some("0 seconds ago"));
    assert_eq!(relative_age(59).as_deref(), Some("59 seconds ago"));
}

#[test]
fn ages_under_an_hour_count_minutes() {
    assert_eq!(relative_age(60).as_deref(), Some("1 minutes ago"));
    assert_eq!(relative_age(7 * 60 + 30).as_deref(), Some("7 minutes ago"));
}

#[test]
fn ages_under_a_day_count_hours() {
    assert_eq!(relative_age(3600).as_deref(), Some("about 1 hours ago"));
    assert_eq!(relative_age(86_399).as_deref(), Some("about 23 hours ago"));
}

#[test]
fn a_day_or_more_and_future_times_fall_back_to_absolute() {
    assert_eq!(relative_age(86_400), None);
    assert_eq!(relative_age(-5), None);
}

// ============================================================================
// Absolute form
// ============================================================================

#[test]
fn ordinal_suffixes_follow_english_rules() {
    let cases = [
        (1, "st"),
        (2, "nd"),
        (3, "rd"),
        (4, "th"),
        (11, "th"),
        (12, "th"),
        (13, "th"),
        (21, "st"),
        (22, "nd"),
        (23, "rd"),
        (31, "st"),
    ];
    for (day, suffix) in cases {
        assert_eq!(ordinal_suffix(day), suffix, "day {}", day);
    }
}

#[test]
fn absolute_form_uses_twelve_hour_clock() {
    let offset = chrono::FixedOffset::east_opt(0).unwrap();
    let afternoon = offset.with_ymd_and_hms(2025, 3, 3, 16, 7, 0).unwrap();
    let midnight = offset.with_ymd_and_hms(2024, 12, 22, 0, 5, 0).unwrap();
    let noon = offset.with_ymd_and_hms(2024, 7, 11, 12, 0, 0).unwrap();

    assert_eq!(format_absolute(afternoon), "Mar 3rd, 2025 4:07PM");
    assert_eq!(format_absolute(midnight), "Dec 22nd, 2024 12:05AM");
    assert_eq!(format_absolute(noon), "Jul 11th, 2024 12:00PM");
}

#[test]
fn offsets_render_as_signed_hours_and_minutes() {
    assert_eq!(format_offset(0), "+00:00");
    assert_eq!(format_offset(120), "+02:00");
    assert_eq!(format_offset(330), "+05:30");
    assert_eq!(format_offset(-300), "-05:00");
    assert_eq!(format_offset(-570), "-09:30");
}

// ============================================================================
// Parsing and description
// ============================================================================

#[test]
fn datetime_attributes_parse_with_or_without_offset() {
    let expected = Utc.with_ymd_and_hms(2025, 3, 3, 15, 53, 0).unwrap();
    assert_eq!(parse_datetime("2025-03-03T15:53:00Z"), Some(expected));
    assert_eq!(parse_datetime("2025-03-03T17:53:00+02:00"), Some(expected));
    assert_eq!(parse_datetime("2025-03-03T15:53:00"), Some(expected));
    assert_eq!(parse_datetime(" 2025-03-03 15:53:00 "), Some(expected));
    assert_eq!(parse_datetime("not a date"), None);
    assert_eq!(parse_datetime(""), None);
}

#[test]
fn recent_timestamps_show_relative_text_and_absolute_title() {
    let now = Utc.with_ymd_and_hms(2025, 3, 3, 16, 0, 0).unwrap();
    let instant = now - TimeDelta::minutes(7);

    let described = describe_timestamp(instant, now, 0);

    assert_eq!(described.text, "7 minutes ago");
    assert_eq!(described.title, "Mar 3rd, 2025 3:53PM");
}

#[test]
fn old_timestamps_show_absolute_text_in_local_time() {
    let now = Utc.with_ymd_and_hms(2025, 3, 3, 16, 0, 0).unwrap();
    let instant = Utc.with_ymd_and_hms(2025, 2, 1, 9, 5, 0).unwrap();

    let described = describe_timestamp(instant, now, 60);

    assert_eq!(described.text, "Feb 1st, 2025 10:05AM");
    assert_eq!(described.text, described.title);
}

#[test]
fn future_timestamps_show_absolute_text() {
    let now = Utc.with_ymd_and_hms(2025, 3, 3, 16, 0, 0).unwrap();
    let described = describe_timestamp(now + TimeDelta::minutes(3), now, 0);
    assert_eq!(described.text, "Mar 3rd, 2025 4:03PM");
}
