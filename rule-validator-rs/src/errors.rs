//! Error handling for the validation library
//!
//! Two kinds of failure exist. Problems with the *data* are recovered
//! locally and reported as [`ValidationError`] values inside a
//! [`ValidationOutcome`]. Problems with the *rules* are programming mistakes
//! in the schema and surface as [`ConfigError`] from the normalizer and the
//! adapters.

use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for operations that can fail on a malformed rule
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Parameters attached to an error for message rendering (e.g. `{min: 5}`)
pub type ErrorParams = IndexMap<String, Value>;

/// Errors raised for malformed rules or misuse of the API
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Rule lacks a type or carries a field of the wrong shape
    #[error("Invalid validator rule: {0}")]
    InvalidRule(String),

    /// Rule references a type name that is not one of the fixed kinds
    #[error("Invalid type {name} must be one of {valid}")]
    InvalidType { name: String, valid: String },

    /// `sanitize` names a coercion that does not exist
    #[error("Unknown sanitize coercion '{0}'")]
    UnknownCoercion(String),

    /// `pattern` source failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// `min`/`max` cannot be interpreted as a number or date
    #[error("Invalid bound for {field}: {value}")]
    InvalidBound { field: &'static str, value: String },

    /// Rule nesting is deeper than the configured maximum
    #[error("Rule nesting exceeds maximum depth of {0}")]
    DepthExceeded(usize),

    /// Input adapter was asked to record a field without a name
    #[error("Field has no name; set one with name() or in the rule")]
    UnnamedField,

    /// Input adapter received an object or array
    #[error("Input validation does not permit complex values (got {0})")]
    ComplexInput(&'static str),

    /// Rule source could not be decoded
    #[error("Failed to parse rule: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fixed taxonomy of value-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Value present but unacceptable
    Invalid,
    /// Required value absent
    Missing,
    /// Required value absent or not coercible
    MissingOrInvalid,
    /// Value present for a strict field that is neither required nor optional
    NotAllowed,
    /// Number below `min`
    Min,
    /// String shorter than `min`
    LenMin,
    /// Number above `max`
    Max,
    /// String longer than `max`
    LenMax,
    /// Date before `min`
    DateMin,
    /// Date after `max`
    DateMax,
}

impl ErrorKind {
    /// Stable taxonomy string, suitable for translation lookup
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Invalid => "invalid",
            ErrorKind::Missing => "missing",
            ErrorKind::MissingOrInvalid => "missingOrInvalid",
            ErrorKind::NotAllowed => "notAllowed",
            ErrorKind::Min => "min",
            ErrorKind::LenMin => "lenMin",
            ErrorKind::Max => "max",
            ErrorKind::LenMax => "lenMax",
            ErrorKind::DateMin => "dateMin",
            ErrorKind::DateMax => "dateMax",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single value-level failure, keyed by the dotted path of the field
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{key}: {kind}")]
pub struct ValidationError {
    /// Dotted path to the offending field
    pub key: String,
    /// Which check failed
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Values needed to render a message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<ErrorParams>,
}

impl ValidationError {
    /// Create an error without parameters
    pub fn new<S: Into<String>>(key: S, kind: ErrorKind) -> Self {
        Self {
            key: key.into(),
            kind,
            params: None,
        }
    }

    /// Attach a named parameter
    pub fn with_param<S: Into<String>>(mut self, name: S, value: Value) -> Self {
        self.params
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value);
        self
    }

    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|p| p.get(name))
    }

    /// Qualify the key with a parent path segment
    pub fn prefixed(mut self, parent: &str) -> Self {
        if !parent.is_empty() {
            self.key = if self.key.is_empty() {
                parent.to_string()
            } else {
                format!("{}.{}", parent, self.key)
            };
        }
        self
    }
}

/// Container for the errors of a failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors {
    /// Collection of validation errors, in the order they were found
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} validation errors:", self.errors.len())?;

        for (idx, err) in self.errors.iter().enumerate() {
            writeln!(f, "  {}. {}", idx + 1, err)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Result of one validation call: an output value and the errors found
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationOutcome {
    /// Produced value; may hold a default even when errors are present
    pub value: Option<Value>,
    /// Errors in input order
    pub errors: Vec<ValidationError>,
}

impl ValidationOutcome {
    /// Successful outcome with a value
    pub fn with_value(value: Value) -> Self {
        Self {
            value: Some(value),
            errors: Vec::new(),
        }
    }

    /// Successful outcome without a value (field legitimately absent)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Failed outcome with a single error
    pub fn error(error: ValidationError) -> Self {
        Self {
            value: None,
            errors: vec![error],
        }
    }

    /// No errors were recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Convert into a `Result`, discarding any default carried by a failure
    pub fn into_result(self) -> Result<Option<Value>, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(self.value)
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_wire_shape() {
        let err = ValidationError::new("a", ErrorKind::Max).with_param("max", Value::from(10));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "key": "a", "type": "max", "params": { "max": 10 } })
        );

        let bare = ValidationError::new("b", ErrorKind::NotAllowed);
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            json!({ "key": "b", "type": "notAllowed" })
        );
    }

    #[test]
    fn test_taxonomy_strings_match_serde() {
        for kind in [
            ErrorKind::Invalid,
            ErrorKind::MissingOrInvalid,
            ErrorKind::LenMin,
            ErrorKind::DateMax,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }

    #[test]
    fn test_prefixed() {
        let err = ValidationError::new("b", ErrorKind::Missing);
        assert_eq!(err.clone().prefixed("root").key, "root.b");
        assert_eq!(err.clone().prefixed("").key, "b");
        assert_eq!(err.prefixed("outer.inner").key, "outer.inner.b");
    }

    #[test]
    fn test_into_result() {
        let ok = ValidationOutcome::with_value(Value::from(8));
        assert_eq!(ok.into_result().unwrap(), Some(Value::from(8)));

        let failed = ValidationOutcome::error(ValidationError::new("a", ErrorKind::Invalid));
        let errs = failed.into_result().unwrap_err();
        assert_eq!(errs.errors.len(), 1);
        assert!(errs.to_string().starts_with("1 validation errors:"));
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::InvalidRule("type is not set".to_string());
        assert_eq!(err.to_string(), "Invalid validator rule: type is not set");
    }
}
