//! Date construction

use super::number::is_whole;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

/// Largest distance from the epoch, in milliseconds, a date may have
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

lazy_static! {
    static ref EPOCH_TEXT_REGEX: Regex = Regex::new(r"^-?[0-9]+$").unwrap();
}

/// Date from milliseconds since the Unix epoch
pub fn date_from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// Parse ISO 8601 text: RFC 3339, a naive date-time (read as UTC) or a date
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Read whole-number text as epoch milliseconds
pub fn parse_epoch_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if !EPOCH_TEXT_REGEX.is_match(text) {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| is_whole(*n))
        .and_then(date_from_millis)
}

/// Construct a date from a date, epoch-millisecond number or ISO text
pub fn to_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Number(n) => date_from_millis(*n),
        Value::String(s) => parse_date_text(s),
        _ => None,
    }
}
