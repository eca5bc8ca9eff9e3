//! Sort keys for the date-part columns the dashboards group and pivot on.

use std::cmp::Ordering;

use chrono::{Month, Weekday};

/// Rank given to values that are not a recognised name; sorts them last.
pub const UNKNOWN_RANK: u32 = 99;

/// January = 1 ... December = 12.
pub fn month_rank(name: Option<&str>) -> u32 {
    name.and_then(|n| n.trim().parse::<Month>().ok())
        .map(|m| m.number_from_month())
        .unwrap_or(UNKNOWN_RANK)
}

/// Monday = 1 ... Sunday = 7.
pub fn weekday_rank(name: Option<&str>) -> u32 {
    name.and_then(|n| n.trim().parse::<Weekday>().ok())
        .map(|d| d.number_from_monday())
        .unwrap_or(UNKNOWN_RANK)
}

pub fn compare_months(a: Option<&str>, b: Option<&str>) -> Ordering {
    month_rank(a).cmp(&month_rank(b))
}

pub fn compare_weekdays(a: Option<&str>, b: Option<&str>) -> Ordering {
    weekday_rank(a).cmp(&weekday_rank(b))
}

/// Parse an hour label such as `"1 PM"` into 0..=23.
///
/// Returns -1 for a missing or unparseable label. A label without a
/// meridian is taken as a 24-hour value.
pub fn parse_hour(label: Option<&str>) -> i32 {
    let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
        return -1;
    };
    let mut parts = label.split_whitespace();
    let Some(hour) = parts.next().and_then(|h| h.parse::<i32>().ok()) else {
        return -1;
    };
    match parts.next().map(str::to_ascii_uppercase).as_deref() {
        Some("AM") if hour == 12 => 0,
        Some("PM") if hour != 12 => hour + 12,
        _ => hour,
    }
}
