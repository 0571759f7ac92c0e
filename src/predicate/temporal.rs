//! Date detection for the temporal filter path
//!
//! There is no declared schema: a field counts as temporal when enough of
//! its values parse as one of the accepted date shapes.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::datum::label_of;

/// Default share of values that must parse before a field is temporal
pub const DEFAULT_TEMPORAL_THRESHOLD: f64 = 0.6;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a string as a UTC timestamp in milliseconds.
pub fn parse_temporal(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // Four-digit year
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = s.parse().ok()?;
        return midnight_millis(NaiveDate::from_ymd_opt(year, 1, 1)?);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            if plausible_year(dt.year()) {
                return Some(dt.and_utc().timestamp_millis());
            }
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return midnight_millis(date);
        }
    }

    // Year-month ("2021-03", "Mar 2021")
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        return midnight_millis(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {}", s), "%d %b %Y") {
        return midnight_millis(date);
    }

    None
}

/// Parse a JSON literal as a timestamp. Numbers are read through their
/// label so `2021` means the year, not 2021 milliseconds.
pub fn parse_temporal_value(value: &Value) -> Option<i64> {
    label_of(value).and_then(|s| parse_temporal(&s))
}

/// Returns true if `hits` out of `total` values clear the threshold.
///
/// The bar is `max(1, floor(total * threshold))`.
pub fn clears_threshold(hits: usize, total: usize, threshold: f64) -> bool {
    let needed = ((total as f64) * threshold).floor() as usize;
    hits >= needed.max(1)
}

// Short numeric tokens like "12-05" or "1/2/3" parse as years 12 or 3
fn plausible_year(year: i32) -> bool {
    (1000..=9999).contains(&year)
}

fn midnight_millis(date: NaiveDate) -> Option<i64> {
    if !plausible_year(date.year()) {
        return None;
    }
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}
