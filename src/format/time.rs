use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Offset, Timelike, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// `±HH:MM` for an offset east of UTC in minutes.
pub fn format_offset(minutes: i32) -> String {
    let sign = if minutes >= 0 { '+' } else { '-' };
    let abs = minutes.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}

/// Relative form for ages under a day; `None` means use the absolute date.
pub fn relative_age(seconds: i64) -> Option<String> {
    match seconds {
        s if s < 0 => None,
        s if s < MINUTE => Some(format!("{} seconds ago", s)),
        s if s < HOUR => Some(format!("{} minutes ago", s / MINUTE)),
        s if s < DAY => Some(format!("about {} hours ago", s / HOUR)),
        _ => None,
    }
}

pub fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// `Mar 3rd, 2025 4:07PM`
pub fn format_absolute(instant: DateTime<FixedOffset>) -> String {
    let (is_pm, hour) = instant.hour12();
    format!(
        "{} {}{}, {} {}:{:02}{}",
        instant.format("%b"),
        instant.day(),
        ordinal_suffix(instant.day()),
        instant.year(),
        hour,
        instant.minute(),
        if is_pm { "PM" } else { "AM" }
    )
}

/// Parse a `datetime` attribute. Values without an offset are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampText {
    /// What the element shows.
    pub text: String,
    /// Hover title; always the absolute form.
    pub title: String,
}

pub fn describe_timestamp(
    instant: DateTime<Utc>,
    now: DateTime<Utc>,
    offset_minutes: i32,
) -> TimestampText {
    let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    let absolute = format_absolute(instant.with_timezone(&offset));
    let age = now.signed_duration_since(instant).num_seconds();
    TimestampText {
        text: relative_age(age).unwrap_or_else(|| absolute.clone()),
        title: absolute,
    }
}
