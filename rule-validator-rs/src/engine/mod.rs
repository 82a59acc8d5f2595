//! Validation engine
//!
//! Applies a canonical [`Rule`] to a value. The dispatcher decides presence
//! (missing, defaulted, required, strict) up front, hands present values to
//! the handler for the rule's type, and substitutes the rule's default when
//! the handler reported errors on a non-strict rule.
//!
//! Validation never fails as a whole: value problems come back as
//! [`ValidationError`]s inside the [`ValidationOutcome`].

mod composite;
mod scalar;

use crate::errors::{ErrorKind, ValidationError, ValidationOutcome};
use crate::rule::{DefaultReason, Rule, RuleType};
use crate::value::{has_value, Value};
use log::{debug, trace};

static NULL: Value = Value::Null;

/// Validate `value` against `rule` with the default presence test
pub fn validate(value: Option<&Value>, rule: &Rule) -> ValidationOutcome {
    Engine::new().validate(value, rule)
}

/// What counts as a missing value at the top level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    /// Absent or null
    #[default]
    HasValue,
    /// Absent, null or the empty string
    NonEmpty,
}

impl Presence {
    fn is_missing(&self, value: Option<&Value>) -> bool {
        match self {
            Presence::HasValue => !has_value(value),
            Presence::NonEmpty => match value {
                Some(Value::String(s)) => s.is_empty(),
                other => !has_value(other),
            },
        }
    }
}

/// Rule dispatcher
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    presence: Presence,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a different top-level presence test
    pub fn with_presence(presence: Presence) -> Self {
        Self { presence }
    }

    /// Validate a value, keying errors by the rule's label
    pub fn validate(&self, value: Option<&Value>, rule: &Rule) -> ValidationOutcome {
        self.apply(value, rule, rule.label().unwrap_or(""))
    }

    /// Validate a value, keying errors by `key`
    pub fn apply(&self, value: Option<&Value>, rule: &Rule, key: &str) -> ValidationOutcome {
        self.dispatch(value, rule, key, self.presence)
    }

    /// Validate a nested value; nested values always use the plain presence test
    pub(crate) fn apply_child(
        &self,
        value: Option<&Value>,
        rule: &Rule,
        key: &str,
    ) -> ValidationOutcome {
        self.dispatch(value, rule, key, Presence::HasValue)
    }

    fn dispatch(
        &self,
        value: Option<&Value>,
        rule: &Rule,
        key: &str,
        presence: Presence,
    ) -> ValidationOutcome {
        let missing = match rule.missing_check() {
            Some(check) => check.is_missing(value),
            None => presence.is_missing(value),
        };

        if missing {
            if let Some(default) = rule.default_value() {
                debug!("Using default for missing value '{}'", key);
                return ValidationOutcome {
                    value: default.resolve(value, rule, None),
                    errors: Vec::new(),
                };
            }
            if rule.is_required() {
                return ValidationOutcome::error(ValidationError::new(key, ErrorKind::Missing));
            }
            return ValidationOutcome::empty();
        }

        if rule.is_strict() && !rule.is_optional() && !rule.is_required() {
            return ValidationOutcome::error(ValidationError::new(key, ErrorKind::NotAllowed));
        }

        let value = value.unwrap_or(&NULL);
        trace!("Applying {} rule to '{}'", rule.kind(), key);

        let mut outcome = match rule.kind() {
            RuleType::String => scalar::string(value, rule, key).into(),
            RuleType::Number | RuleType::Integer => scalar::number(value, rule, key).into(),
            RuleType::Boolean => scalar::boolean(value, rule, key).into(),
            RuleType::Date => scalar::date(value, rule, key).into(),
            RuleType::Null => scalar::null(value, rule, key).into(),
            RuleType::Any => ValidationOutcome::with_value(value.clone()),
            RuleType::Object => composite::object(self, value, rule, key),
            RuleType::Array => composite::array(self, value, rule, key),
        };

        if outcome.has_errors() && !rule.is_strict() {
            if let Some(default) = rule.default_value() {
                debug!("Substituting default for invalid value '{}'", key);
                outcome.value = default.resolve(Some(value), rule, None);
            }
        }

        outcome
    }
}

/// Result of a scalar handler: a produced value or a single error
pub(crate) type HandlerResult = Result<Option<Value>, ValidationError>;

impl From<HandlerResult> for ValidationOutcome {
    fn from(result: HandlerResult) -> Self {
        match result {
            Ok(Some(value)) => ValidationOutcome::with_value(value),
            Ok(None) => ValidationOutcome::empty(),
            Err(error) => ValidationOutcome::error(error),
        }
    }
}

/// Resolve the rule's default if it can stand in for a value of this type
///
/// Callbacks always qualify; literals qualify when `convert` accepts them.
/// Returns `None` when there is no usable default.
pub(crate) fn substitute_default<F>(
    rule: &Rule,
    value: Option<&Value>,
    reason: Option<DefaultReason>,
    convert: F,
) -> Option<Option<Value>>
where
    F: Fn(&Value) -> Option<Value>,
{
    let default = rule.default_value()?;
    match default.literal() {
        Some(literal) => convert(literal).map(Some),
        None => Some(default.resolve(value, rule, reason)),
    }
}

/// Default if usable, else an error whose kind depends on `required`
pub(crate) fn fallback<F>(
    value: &Value,
    rule: &Rule,
    key: &str,
    required_kind: ErrorKind,
    convert: F,
) -> HandlerResult
where
    F: Fn(&Value) -> Option<Value>,
{
    if let Some(default) = substitute_default(rule, Some(value), None, convert) {
        return Ok(default);
    }
    let kind = if rule.is_required() {
        required_kind
    } else {
        ErrorKind::Invalid
    };
    Err(ValidationError::new(key, kind))
}
