//! # Rule Validator
//!
//! Rule-driven validation and sanitization of loosely typed values.
//!
//! Declarative rules (JSON or built in code) are normalized into canonical
//! [`Rule`]s and applied to [`Value`]s, producing a typed output value and a
//! list of path-qualified [`ValidationError`]s. Form input and API responses
//! are served by thin adapters over the same engine.
//!
//! ## Features
//!
//! - Typed handlers for strings, numbers, integers, booleans, dates and null
//! - Recursive validation of object properties and array elements
//! - Sanitization (coercion) and default substitution per rule
//! - Strict, required and optional presence semantics
//! - A library of named rules (`email`, `posInt`, ...) extensible by callers
//! - Changeset collection with reference-document diffing for form input
//!
//! ```
//! use rule_validator::prelude::*;
//! use serde_json::json;
//!
//! let rule = normalize_rule(&RuleSource::from_value(json!({
//!     "name": "count", "type": "integer", "min": 5, "max": 10
//! })).unwrap()).unwrap();
//!
//! let outcome = validate(Some(&Value::from(8)), &rule);
//! assert!(outcome.is_valid());
//! ```

pub mod adapters;
pub mod engine;
mod errors;
pub mod rule;
pub mod sanitizers;
mod value;

pub use adapters::{InputField, InputValidator, ResponseValidator};
pub use engine::{validate, Engine, Presence};
pub use errors::{
    ConfigError, ConfigResult, ErrorKind, ErrorParams, ValidationError, ValidationErrors,
    ValidationOutcome,
};
pub use rule::{
    normalize_rule, Normalizer, Rule, RuleBuilder, RuleLibrary, RuleSource, RuleSpec, RuleType,
};
pub use value::{has_value, Map, Value};

use log::warn;
use std::env;

/// Re-export commonly used items for convenience
pub mod prelude {
    pub use crate::adapters::{InputValidator, ResponseValidator};
    pub use crate::engine::validate;
    pub use crate::errors::{ConfigError, ErrorKind, ValidationError, ValidationOutcome};
    pub use crate::rule::{normalize_rule, Coercion, Rule, RuleSource, RuleSpec, RuleType};
    pub use crate::value::{Map, Value};
}

/// Version of the validation library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default maximum rule nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Trim form input by default
pub const DEFAULT_TRIM_INPUT: bool = true;

/// Leave form input in its original Unicode form by default
pub const DEFAULT_NORMALIZE_UNICODE: bool = false;

/// Configuration for the validation library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Maximum nesting of rules accepted by the normalizer
    pub max_depth: usize,
    /// Trim surrounding whitespace from form input
    pub trim_input: bool,
    /// Apply NFC normalization to form input
    pub normalize_unicode: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trim_input: DEFAULT_TRIM_INPUT,
            normalize_unicode: DEFAULT_NORMALIZE_UNICODE,
        }
    }
}

impl ValidationConfig {
    /// Defaults overridden by `RULE_VALIDATOR_*` environment variables
    ///
    /// Malformed values are logged and ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_depth: env_or("RULE_VALIDATOR_MAX_DEPTH", defaults.max_depth),
            trim_input: env_or("RULE_VALIDATOR_TRIM_INPUT", defaults.trim_input),
            normalize_unicode: env_or(
                "RULE_VALIDATOR_NORMALIZE_UNICODE",
                defaults.normalize_unicode,
            ),
        }
    }
}

fn env_or<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env::var(var_name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Invalid value '{}' in {}, using default {}", raw, var_name, default);
            default
        }),
        Err(_) => default,
    }
}

/// Get a new default configuration
pub fn default_config() -> ValidationConfig {
    ValidationConfig::default()
}

/// Create an input validator with default settings
pub fn input() -> InputValidator {
    InputValidator::new()
}

/// Create a response validator with default settings
pub fn response() -> ResponseValidator {
    ResponseValidator::new()
}
