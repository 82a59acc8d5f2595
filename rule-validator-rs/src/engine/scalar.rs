//! Handlers for scalar types
//!
//! Each handler gets a present value: match the type directly, else
//! sanitize, else default, else error. Matched values then go through the
//! rule's pattern and bound checks.

use super::{fallback, substitute_default, HandlerResult};
use crate::errors::{ErrorKind, ValidationError};
use crate::rule::{Bound, Coercion, DefaultReason, Rule, RuleType};
use crate::sanitizers::{
    apply_rounding, is_whole, parse_bool_text, parse_epoch_text, parse_float, round_half_up,
    text_length, to_date, to_text,
};
use crate::value::Value;
use chrono::{DateTime, Utc};

fn as_string(v: &Value) -> Option<Value> {
    v.is_string().then(|| v.clone())
}

fn as_number(v: &Value) -> Option<Value> {
    v.is_number().then(|| v.clone())
}

fn as_boolean(v: &Value) -> Option<Value> {
    v.is_bool().then(|| v.clone())
}

fn as_date(v: &Value) -> Option<Value> {
    to_date(v).map(Value::Date)
}

fn as_null(v: &Value) -> Option<Value> {
    v.is_null().then(|| Value::Null)
}

/// Error for a failed bound check, carrying the bound as a parameter
fn bound_error(key: &str, kind: ErrorKind, param: &str, bound: Value) -> ValidationError {
    ValidationError::new(key, kind).with_param(param, bound)
}

pub(super) fn string(value: &Value, rule: &Rule, key: &str) -> HandlerResult {
    let text = match value {
        Value::String(s) => s.clone(),
        other => {
            if let Some(sanitize) = rule.sanitize_callback() {
                match sanitize(other, rule) {
                    Some(Value::String(s)) => s,
                    Some(coerced) => to_text(&coerced),
                    None => return fallback(other, rule, key, ErrorKind::Missing, as_string),
                }
            } else if rule.sanitizes() {
                to_text(other)
            } else {
                return fallback(other, rule, key, ErrorKind::Missing, as_string);
            }
        }
    };
    check_text(text, rule, key)
}

fn check_text(text: String, rule: &Rule, key: &str) -> HandlerResult {
    if let Some(pattern) = rule.pattern() {
        if !pattern.test(&text, rule) {
            return Err(ValidationError::new(key, ErrorKind::Invalid));
        }
    }

    let len = text_length(&text) as f64;
    let value = Value::String(text);

    if let Some(min) = rule.min() {
        if len < min.as_number() {
            return substitute_default(rule, Some(&value), Some(DefaultReason::Min), as_string)
                .ok_or_else(|| bound_error(key, ErrorKind::LenMin, "min", min.to_value()));
        }
    }
    if let Some(max) = rule.max() {
        if len > max.as_number() {
            return substitute_default(rule, Some(&value), Some(DefaultReason::Max), as_string)
                .ok_or_else(|| bound_error(key, ErrorKind::LenMax, "max", max.to_value()));
        }
    }

    Ok(Some(value))
}

fn is_rounding(coercion: Coercion) -> bool {
    matches!(
        coercion,
        Coercion::Integer | Coercion::Round | Coercion::Floor | Coercion::Ceil | Coercion::Trunc
    )
}

pub(super) fn number(value: &Value, rule: &Rule, key: &str) -> HandlerResult {
    let integer = rule.kind() == RuleType::Integer;
    let rounding = rule.coercion().filter(|c| is_rounding(*c));

    let n = match value {
        Value::Number(n) if !n.is_nan() => {
            if !integer {
                rounding.map_or(*n, |c| apply_rounding(*n, c))
            } else if let Some(sanitize) = rule.sanitize_callback() {
                match sanitize(value, rule).as_ref().and_then(Value::as_f64) {
                    Some(coerced) => coerced,
                    None => return fallback(value, rule, key, ErrorKind::MissingOrInvalid, as_number),
                }
            } else if let Some(coercion) = rounding {
                apply_rounding(*n, coercion)
            } else if rule.sanitizes() {
                round_half_up(*n)
            } else if !is_whole(*n) {
                return Err(ValidationError::new(key, ErrorKind::Invalid));
            } else {
                *n
            }
        }
        other => {
            let coerced = match (rule.sanitize_callback(), other) {
                (Some(sanitize), _) => sanitize(other, rule).as_ref().and_then(Value::as_f64),
                (None, Value::String(s)) => parse_float(s).map(|n| match rounding {
                    Some(coercion) => apply_rounding(n, coercion),
                    None if integer => round_half_up(n),
                    None => n,
                }),
                (None, _) => None,
            };
            match coerced {
                Some(n) => n,
                None => return fallback(other, rule, key, ErrorKind::MissingOrInvalid, as_number),
            }
        }
    };

    check_number(n, rule, key)
}

fn check_number(n: f64, rule: &Rule, key: &str) -> HandlerResult {
    let value = Value::Number(n);

    if let Some(min) = rule.min() {
        if n < min.as_number() {
            return substitute_default(rule, Some(&value), Some(DefaultReason::Min), as_number)
                .ok_or_else(|| bound_error(key, ErrorKind::Min, "min", min.to_value()));
        }
    }
    if let Some(max) = rule.max() {
        if n > max.as_number() {
            return substitute_default(rule, Some(&value), Some(DefaultReason::Max), as_number)
                .ok_or_else(|| bound_error(key, ErrorKind::Max, "max", max.to_value()));
        }
    }

    Ok(Some(value))
}

pub(super) fn boolean(value: &Value, rule: &Rule, key: &str) -> HandlerResult {
    if let Value::Bool(b) = value {
        return Ok(Some(Value::Bool(*b)));
    }

    if let Some(sanitize) = rule.sanitize_callback() {
        if let Some(coerced) = sanitize(value, rule) {
            return Ok(Some(coerced));
        }
    } else if rule.sanitizes() {
        let parsed = match value {
            Value::Number(n) if *n > 0.0 => Some(true),
            Value::String(s) => parse_bool_text(s),
            _ => None,
        };
        if let Some(b) = parsed {
            return Ok(Some(Value::Bool(b)));
        }
    }

    fallback(value, rule, key, ErrorKind::MissingOrInvalid, as_boolean)
}

pub(super) fn date(value: &Value, rule: &Rule, key: &str) -> HandlerResult {
    let date = match value {
        Value::Date(d) => *d,
        other => {
            let constructed = if let Some(sanitize) = rule.sanitize_callback() {
                sanitize(other, rule).as_ref().and_then(to_date)
            } else if rule.sanitizes() {
                match other {
                    Value::String(s) => parse_epoch_text(s).or_else(|| to_date(other)),
                    _ => to_date(other),
                }
            } else {
                to_date(other)
            };
            match constructed {
                Some(d) => d,
                None => return fallback(other, rule, key, ErrorKind::MissingOrInvalid, as_date),
            }
        }
    };

    check_date(date, rule, key)
}

fn check_date(date: DateTime<Utc>, rule: &Rule, key: &str) -> HandlerResult {
    let value = Value::Date(date);

    if let Some(min) = rule.min().and_then(Bound::as_date) {
        if date < min {
            return substitute_default(rule, Some(&value), Some(DefaultReason::Min), as_date)
                .ok_or_else(|| bound_error(key, ErrorKind::DateMin, "min", Value::Date(min)));
        }
    }
    if let Some(max) = rule.max().and_then(Bound::as_date) {
        if date > max {
            return substitute_default(rule, Some(&value), Some(DefaultReason::Max), as_date)
                .ok_or_else(|| bound_error(key, ErrorKind::DateMax, "max", Value::Date(max)));
        }
    }

    Ok(Some(value))
}

pub(super) fn null(value: &Value, rule: &Rule, key: &str) -> HandlerResult {
    if value.is_null() {
        return Ok(Some(Value::Null));
    }

    if let Some(sanitize) = rule.sanitize_callback() {
        if let Some(coerced) = sanitize(value, rule) {
            return Ok(Some(coerced));
        }
    }
    if let Some(default) = substitute_default(rule, Some(value), None, as_null) {
        return Ok(default);
    }
    if rule.is_required() {
        return Err(ValidationError::new(key, ErrorKind::MissingOrInvalid));
    }
    Ok(None)
}
