//! Numeric coercion

use crate::rule::Coercion;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FLOAT_PREFIX_REGEX: Regex =
        Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)").unwrap();
}

/// Parse the longest numeric prefix of `text`, ignoring leading whitespace
///
/// `"12px"` gives 12, `"  -3.5e2 apples"` gives -350, `"abc"` gives `None`.
pub fn parse_float(text: &str) -> Option<f64> {
    let prefix = FLOAT_PREFIX_REGEX.find(text.trim_start())?.as_str();
    match prefix.trim_start_matches(&['+', '-'][..]) {
        "Infinity" => Some(if prefix.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }),
        _ => prefix.parse::<f64>().ok(),
    }
}

/// Round half up, so `2.5` gives 3 and `-2.5` gives -2
pub fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}

/// Whether `n` has no fractional part
pub fn is_whole(n: f64) -> bool {
    round_half_up(n) == n
}

/// Apply a named rounding; non-rounding coercions leave `n` unchanged
pub fn apply_rounding(n: f64, coercion: Coercion) -> f64 {
    match coercion {
        Coercion::Integer | Coercion::Round => round_half_up(n),
        Coercion::Floor => n.floor(),
        Coercion::Ceil => n.ceil(),
        Coercion::Trunc => n.trunc(),
        Coercion::String | Coercion::Boolean | Coercion::Date => n,
    }
}
