//! Text coercion
//!
//! `to_text` renders scalars the way loosely typed form and JSON payloads
//! expect (`1` not `1.0`, `true`, `null`), which keeps string coercion of
//! numeric input stable across round trips.

use super::SanitizeResult;
use crate::value::Value;
use chrono::SecondsFormat;
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TRUE_REGEX: Regex = Regex::new(r"(?i)^true$").unwrap();
    static ref FALSE_REGEX: Regex = Regex::new(r"(?i)^false$").unwrap();
    static ref DIGITS_REGEX: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// Render a number as text the way JavaScript's `String()` does
pub fn number_to_text(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // exponent form with an explicit sign, as in `1e+21`
        let text = format!("{:e}", n);
        match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        }
    } else {
        n.to_string()
    }
}

/// Render any value as text
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_text(*n),
        Value::String(s) => s.clone(),
        Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Read `true`/`false` (any case) or a run of digits (`0` is false)
pub fn parse_bool_text(text: &str) -> Option<bool> {
    if TRUE_REGEX.is_match(text) {
        Some(true)
    } else if FALSE_REGEX.is_match(text) {
        Some(false)
    } else if DIGITS_REGEX.is_match(text) {
        Some(text.chars().any(|c| c != '0'))
    } else {
        None
    }
}

/// Trim whitespace from beginning and end
pub fn trim_whitespace(input: &str) -> SanitizeResult<String> {
    let trimmed = input.trim();

    if trimmed.len() == input.len() {
        SanitizeResult::unmodified(input.to_string())
    } else {
        SanitizeResult::modified(trimmed.to_string(), Some("Trimmed whitespace".to_string()))
    }
}

/// Normalize Unicode text (NFC form)
pub fn normalize_unicode(input: &str) -> SanitizeResult<String> {
    let normalized = input.nfc().collect::<String>();

    if normalized == input {
        SanitizeResult::unmodified(input.to_string())
    } else {
        SanitizeResult::modified(
            normalized,
            Some("Normalized Unicode characters".to_string()),
        )
    }
}

/// Number of characters, as used by length bounds
pub fn text_length(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use test_case::test_case;

    #[test_case(Value::Null, "null")]
    #[test_case(Value::Bool(true), "true")]
    #[test_case(Value::Number(42.0), "42")]
    #[test_case(Value::Number(2.5), "2.5")]
    #[test_case(Value::Number(-0.0), "0")]
    #[test_case(Value::Number(f64::INFINITY), "Infinity")]
    #[test_case(Value::Number(1e21), "1e+21")]
    #[test_case(Value::Number(1.23e27), "1.23e+27")]
    #[test_case(Value::Number(1e-7), "1e-7")]
    #[test_case(Value::Number(-2.5e-8), "-2.5e-8")]
    #[test_case(Value::Number(123456789012345680000.0), "123456789012345680000")]
    #[test_case(Value::Number(0.000001), "0.000001")]
    #[test_case(Value::Array(vec![Value::from(1), Value::Null, Value::from("x")]), "1,,x")]
    fn test_to_text(value: Value, expected: &str) {
        assert_eq!(to_text(&value), expected);
    }

    #[test]
    fn test_date_to_text() {
        let date = Utc.with_ymd_and_hms(2019, 7, 26, 0, 0, 0).unwrap();
        assert_eq!(to_text(&Value::from(date)), "2019-07-26T00:00:00.000Z");
    }

    #[test_case("true", Some(true))]
    #[test_case("TRUE", Some(true))]
    #[test_case("False", Some(false))]
    #[test_case("0", Some(false))]
    #[test_case("000", Some(false))]
    #[test_case("12", Some(true))]
    #[test_case("yes", None)]
    #[test_case("-1", None)]
    fn test_parse_bool_text(text: &str, expected: Option<bool>) {
        assert_eq!(parse_bool_text(text), expected);
    }

    #[test]
    fn test_trim_whitespace() {
        let result = trim_whitespace("  ok  ");
        assert!(result.was_modified);
        assert_eq!(result.sanitized, "ok");

        assert!(!trim_whitespace("ok").was_modified);
    }

    #[test]
    fn test_text_length_counts_chars() {
        assert_eq!(text_length("héllo"), 5);
    }
}
