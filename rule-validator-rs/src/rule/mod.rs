//! Canonical validation rules
//!
//! A [`Rule`] is the normalized form of a declarative rule description. It is
//! immutable once built and can be shared across validation calls and
//! threads. Rules are produced either directly through [`RuleBuilder`] or from
//! a [`RuleSource`] by the [`Normalizer`].

mod library;
mod normalize;
mod source;

pub use library::RuleLibrary;
pub use normalize::{normalize_rule, Normalizer};
pub use source::{
    BoundSpec, MissingSpec, PatternSpec, PresenceSpec, RuleSource, RuleSpec, SanitizeSpec,
};

use crate::errors::{ConfigError, ConfigResult};
use crate::value::Value;
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Predicate used as a string pattern
pub type PatternFn = Arc<dyn Fn(&str, &Rule) -> bool + Send + Sync>;

/// Coercion callback; `None` means the value could not be coerced
pub type SanitizeFn = Arc<dyn Fn(&Value, &Rule) -> Option<Value> + Send + Sync>;

/// Default callback, given the offending value (if any) and why a default is needed
pub type DefaultFn =
    Arc<dyn Fn(Option<&Value>, &Rule, Option<DefaultReason>) -> Option<Value> + Send + Sync>;

/// Override of the "is this value absent" test
pub type MissingFn = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// The fixed set of value kinds a rule can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Null,
    Object,
    Array,
    Any,
}

impl RuleType {
    /// Every kind, in the order used for error messages
    pub const ALL: [RuleType; 9] = [
        RuleType::String,
        RuleType::Number,
        RuleType::Boolean,
        RuleType::Null,
        RuleType::Object,
        RuleType::Array,
        RuleType::Date,
        RuleType::Any,
        RuleType::Integer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::String => "string",
            RuleType::Number => "number",
            RuleType::Integer => "integer",
            RuleType::Boolean => "boolean",
            RuleType::Date => "date",
            RuleType::Null => "null",
            RuleType::Object => "object",
            RuleType::Array => "array",
            RuleType::Any => "any",
        }
    }

    /// Comma-separated list of valid kind names
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(RuleType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for RuleType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidType {
                name: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test applied to string values
#[derive(Clone)]
pub enum Pattern {
    Regex(Regex),
    Predicate(PatternFn),
}

impl Pattern {
    /// Whether `text` satisfies the pattern
    pub fn test(&self, text: &str, rule: &Rule) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(text),
            Pattern::Predicate(f) => f(text, rule),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Pattern::Predicate(_) => f.write_str("Predicate(<callback>)"),
        }
    }
}

/// Named coercions accepted by `sanitize`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Integer,
    String,
    Boolean,
    Date,
    Round,
    Floor,
    Ceil,
    Trunc,
}

impl Coercion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Coercion::Integer => "integer",
            Coercion::String => "string",
            Coercion::Boolean => "boolean",
            Coercion::Date => "date",
            Coercion::Round => "round",
            Coercion::Floor => "floor",
            Coercion::Ceil => "ceil",
            Coercion::Trunc => "trunc",
        }
    }
}

impl FromStr for Coercion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(Coercion::Integer),
            "string" => Ok(Coercion::String),
            "boolean" => Ok(Coercion::Boolean),
            "date" => Ok(Coercion::Date),
            "round" => Ok(Coercion::Round),
            "floor" => Ok(Coercion::Floor),
            "ceil" => Ok(Coercion::Ceil),
            "trunc" => Ok(Coercion::Trunc),
            other => Err(ConfigError::UnknownCoercion(other.to_string())),
        }
    }
}

/// Coercion directive applied to values that are not already the right type
#[derive(Clone)]
pub enum Sanitize {
    /// `true` enables type-appropriate coercion, `false` disables it
    Enabled(bool),
    /// A named coercion
    Coerce(Coercion),
    /// Caller-supplied coercion
    Callback(SanitizeFn),
}

impl Sanitize {
    /// Whether the directive asks for any coercion at all
    pub fn is_enabled(&self) -> bool {
        match self {
            Sanitize::Enabled(enabled) => *enabled,
            Sanitize::Coerce(_) | Sanitize::Callback(_) => true,
        }
    }

    pub fn callback(&self) -> Option<&SanitizeFn> {
        match self {
            Sanitize::Callback(f) => Some(f),
            _ => None,
        }
    }

    pub fn coercion(&self) -> Option<Coercion> {
        match self {
            Sanitize::Coerce(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Debug for Sanitize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sanitize::Enabled(b) => f.debug_tuple("Enabled").field(b).finish(),
            Sanitize::Coerce(c) => f.debug_tuple("Coerce").field(c).finish(),
            Sanitize::Callback(_) => f.write_str("Callback(<callback>)"),
        }
    }
}

/// Why a default is being requested after a bound check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    Min,
    Max,
}

/// Value substituted for absent or invalid input
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Callback(DefaultFn),
}

impl DefaultValue {
    /// Produce the default for `value`
    pub fn resolve(
        &self,
        value: Option<&Value>,
        rule: &Rule,
        reason: Option<DefaultReason>,
    ) -> Option<Value> {
        match self {
            DefaultValue::Literal(v) => Some(v.clone()),
            DefaultValue::Callback(f) => f(value, rule, reason),
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self, DefaultValue::Callback(_))
    }

    pub fn literal(&self) -> Option<&Value> {
        match self {
            DefaultValue::Literal(v) => Some(v),
            DefaultValue::Callback(_) => None,
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DefaultValue::Callback(_) => f.write_str("Callback(<callback>)"),
        }
    }
}

/// Lower or upper bound: a number (value or length) or a date
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Number(f64),
    Date(DateTime<Utc>),
}

impl Bound {
    /// Numeric view; dates become epoch milliseconds
    pub fn as_number(&self) -> f64 {
        match self {
            Bound::Number(n) => *n,
            Bound::Date(d) => d.timestamp_millis() as f64,
        }
    }

    /// Date view; numbers are read as epoch milliseconds
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Bound::Number(n) if n.is_finite() => Utc.timestamp_millis_opt(*n as i64).single(),
            Bound::Number(_) => None,
            Bound::Date(d) => Some(*d),
        }
    }

    /// Representation used in error params
    pub fn to_value(&self) -> Value {
        match self {
            Bound::Number(n) => Value::Number(*n),
            Bound::Date(d) => Value::Date(*d),
        }
    }
}

impl From<f64> for Bound {
    fn from(n: f64) -> Self {
        Bound::Number(n)
    }
}

impl From<i64> for Bound {
    fn from(n: i64) -> Self {
        Bound::Number(n as f64)
    }
}

impl From<i32> for Bound {
    fn from(n: i32) -> Self {
        Bound::Number(f64::from(n))
    }
}

impl From<usize> for Bound {
    fn from(n: usize) -> Self {
        Bound::Number(n as f64)
    }
}

impl From<DateTime<Utc>> for Bound {
    fn from(d: DateTime<Utc>) -> Self {
        Bound::Date(d)
    }
}

/// Per-field redefinition of emptiness
#[derive(Clone)]
pub enum MissingCheck {
    /// Value counts as missing when absent or equal to one of these
    Sentinels(Vec<Value>),
    /// Caller decides
    Predicate(MissingFn),
    /// Value is always (or never) missing
    Always(bool),
}

impl MissingCheck {
    pub fn is_missing(&self, value: Option<&Value>) -> bool {
        match self {
            MissingCheck::Sentinels(sentinels) => match value {
                None => true,
                Some(v) => sentinels.contains(v),
            },
            MissingCheck::Predicate(f) => f(value),
            MissingCheck::Always(flag) => *flag,
        }
    }
}

impl fmt::Debug for MissingCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingCheck::Sentinels(s) => f.debug_tuple("Sentinels").field(s).finish(),
            MissingCheck::Predicate(_) => f.write_str("Predicate(<callback>)"),
            MissingCheck::Always(b) => f.debug_tuple("Always").field(b).finish(),
        }
    }
}

/// Canonical validation/sanitization directive for one value
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) name: Option<String>,
    pub(crate) label: Option<String>,
    pub(crate) kind: RuleType,
    pub(crate) format: Option<String>,
    pub(crate) pattern: Option<Pattern>,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) min: Option<Bound>,
    pub(crate) max: Option<Bound>,
    pub(crate) sanitize: Option<Sanitize>,
    pub(crate) required: bool,
    pub(crate) optional: bool,
    pub(crate) strict: bool,
    pub(crate) properties: IndexMap<String, Rule>,
    pub(crate) item_type: Option<Box<Rule>>,
    pub(crate) append_to_array: bool,
    pub(crate) is_missing: Option<MissingCheck>,
}

impl Rule {
    /// Start building a rule of the given kind
    pub fn builder(kind: RuleType) -> RuleBuilder {
        RuleBuilder::new(kind)
    }

    /// Shorthand for a rule with only a type
    pub fn of(kind: RuleType) -> Rule {
        RuleBuilder::new(kind).rule
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Display key for error reporting; falls back to the name
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref().or(self.name.as_deref())
    }

    pub fn kind(&self) -> RuleType {
        self.kind
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn min(&self) -> Option<&Bound> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Bound> {
        self.max.as_ref()
    }

    pub fn sanitize(&self) -> Option<&Sanitize> {
        self.sanitize.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn properties(&self) -> &IndexMap<String, Rule> {
        &self.properties
    }

    pub fn item_type(&self) -> Option<&Rule> {
        self.item_type.as_deref()
    }

    pub fn appends_to_array(&self) -> bool {
        self.append_to_array
    }

    pub fn missing_check(&self) -> Option<&MissingCheck> {
        self.is_missing.as_ref()
    }

    /// Whether `sanitize` asks for coercion
    pub(crate) fn sanitizes(&self) -> bool {
        self.sanitize.as_ref().map_or(false, Sanitize::is_enabled)
    }

    pub(crate) fn sanitize_callback(&self) -> Option<&SanitizeFn> {
        self.sanitize.as_ref().and_then(Sanitize::callback)
    }

    pub(crate) fn coercion(&self) -> Option<Coercion> {
        self.sanitize.as_ref().and_then(Sanitize::coercion)
    }

    /// Default the label and check invariants
    pub(crate) fn into_checked(mut self) -> ConfigResult<Rule> {
        if self.label.is_none() {
            self.label = self.name.clone();
        }
        self.check()?;
        Ok(self)
    }

    fn check(&self) -> ConfigResult<()> {
        if !self.properties.is_empty() && self.kind != RuleType::Object {
            return Err(ConfigError::InvalidRule(format!(
                "properties declared on a rule of type {}",
                self.kind
            )));
        }
        if self.item_type.is_some() && self.kind != RuleType::Array {
            return Err(ConfigError::InvalidRule(format!(
                "itemType declared on a rule of type {}",
                self.kind
            )));
        }
        if let (Some(Bound::Number(min)), Some(Bound::Number(max))) = (&self.min, &self.max) {
            if min > max {
                return Err(ConfigError::InvalidRule(format!(
                    "min {} is greater than max {}",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

/// Builder for rules
#[derive(Debug)]
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    /// Create a new rule builder
    pub fn new(kind: RuleType) -> Self {
        Self {
            rule: Rule {
                name: None,
                label: None,
                kind,
                format: None,
                pattern: None,
                default: None,
                min: None,
                max: None,
                sanitize: None,
                required: false,
                optional: false,
                strict: false,
                properties: IndexMap::new(),
                item_type: None,
                append_to_array: false,
                is_missing: None,
            },
        }
    }

    /// Machine name, used as the changeset key
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.rule.name = Some(name.into());
        self
    }

    /// Display name used in error keys
    pub fn label<S: Into<String>>(mut self, label: S) -> Self {
        self.rule.label = Some(label.into());
        self
    }

    /// Record the library format this rule was derived from
    pub fn format<S: Into<String>>(mut self, format: S) -> Self {
        self.rule.format = Some(format.into());
        self
    }

    /// Regular expression strings must match
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.rule.pattern = Some(Pattern::Regex(pattern));
        self
    }

    /// Predicate strings must satisfy
    pub fn predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, &Rule) -> bool + Send + Sync + 'static,
    {
        self.rule.pattern = Some(Pattern::Predicate(Arc::new(predicate)));
        self
    }

    /// Literal default
    pub fn default_value<V: Into<Value>>(mut self, value: V) -> Self {
        self.rule.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Computed default
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Value>, &Rule, Option<DefaultReason>) -> Option<Value>
            + Send
            + Sync
            + 'static,
    {
        self.rule.default = Some(DefaultValue::Callback(Arc::new(f)));
        self
    }

    /// Lower bound (value, length, or date)
    pub fn min<B: Into<Bound>>(mut self, min: B) -> Self {
        self.rule.min = Some(min.into());
        self
    }

    /// Upper bound (value, length, or date)
    pub fn max<B: Into<Bound>>(mut self, max: B) -> Self {
        self.rule.max = Some(max.into());
        self
    }

    /// Enable or disable type-appropriate coercion
    pub fn sanitize(mut self, enabled: bool) -> Self {
        self.rule.sanitize = Some(Sanitize::Enabled(enabled));
        self
    }

    /// Use a named coercion
    pub fn coerce(mut self, coercion: Coercion) -> Self {
        self.rule.sanitize = Some(Sanitize::Coerce(coercion));
        self
    }

    /// Use a coercion callback
    pub fn sanitize_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Rule) -> Option<Value> + Send + Sync + 'static,
    {
        self.rule.sanitize = Some(Sanitize::Callback(Arc::new(f)));
        self
    }

    /// Mark value as required
    pub fn required(mut self) -> Self {
        self.rule.required = true;
        self
    }

    /// Mark value as optional
    pub fn optional(mut self) -> Self {
        self.rule.optional = true;
        self
    }

    /// Reject values for fields that are neither required nor optional
    pub fn strict(mut self) -> Self {
        self.rule.strict = true;
        self
    }

    /// Declare a child property of an object rule
    pub fn property<S: Into<String>>(mut self, name: S, mut rule: Rule) -> Self {
        let name = name.into();
        if rule.name.is_none() {
            rule.name = Some(name.clone());
        }
        self.rule.properties.insert(name, rule);
        self
    }

    /// Rule applied to every element of an array rule
    pub fn item_type(mut self, rule: Rule) -> Self {
        self.rule.item_type = Some(Box::new(rule));
        self
    }

    /// Push into the changeset instead of replacing
    pub fn append_to_array(mut self) -> Self {
        self.rule.append_to_array = true;
        self
    }

    /// Redefine what counts as a missing value
    pub fn missing_when(mut self, check: MissingCheck) -> Self {
        self.rule.is_missing = Some(check);
        self
    }

    /// Treat any of these values as missing
    pub fn missing_values(self, sentinels: Vec<Value>) -> Self {
        self.missing_when(MissingCheck::Sentinels(sentinels))
    }

    /// Build the rule, checking its invariants
    pub fn build(self) -> ConfigResult<Rule> {
        self.rule.into_checked()
    }
}
