//! Raw rule descriptions
//!
//! A [`RuleSource`] is what callers write: either a symbolic name (library
//! entry or primitive kind) or a structured [`RuleSpec`] with every field
//! optional. Both deserialize from JSON.

use super::{DefaultValue, MissingFn, PatternFn, SanitizeFn};
use crate::errors::ConfigResult;
use crate::value::Value;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

/// A rule as written by the caller
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleSource {
    /// Library entry or `|`-joined primitive kind names
    Name(String),
    /// Structured description
    Spec(Box<RuleSpec>),
}

impl RuleSource {
    /// Parse a rule from JSON text
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode a rule from a JSON value
    pub fn from_value(value: serde_json::Value) -> ConfigResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

impl From<&str> for RuleSource {
    fn from(name: &str) -> Self {
        RuleSource::Name(name.to_string())
    }
}

impl From<String> for RuleSource {
    fn from(name: String) -> Self {
        RuleSource::Name(name)
    }
}

impl From<RuleSpec> for RuleSource {
    fn from(spec: RuleSpec) -> Self {
        RuleSource::Spec(Box::new(spec))
    }
}

/// Structured rule description; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    pub name: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub format: Option<String>,
    pub pattern: Option<PatternSpec>,
    #[serde(default, deserialize_with = "literal_default")]
    pub default: Option<DefaultValue>,
    pub min: Option<BoundSpec>,
    pub max: Option<BoundSpec>,
    pub sanitize: Option<SanitizeSpec>,
    pub required: Option<PresenceSpec>,
    pub optional: Option<PresenceSpec>,
    pub strict: Option<bool>,
    pub properties: Option<IndexMap<String, RuleSource>>,
    #[serde(alias = "arrayType")]
    pub item_type: Option<Box<RuleSource>>,
    pub append_to_array: Option<bool>,
    pub is_missing: Option<MissingSpec>,
}

impl RuleSpec {
    /// Description with only a type name set
    pub fn of_type<S: Into<String>>(kind: S) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Copy every field set on `fragment` over this description
    pub fn overlay(&mut self, fragment: &RuleSpec) {
        fn take<T: Clone>(slot: &mut Option<T>, from: &Option<T>) {
            if let Some(v) = from {
                *slot = Some(v.clone());
            }
        }

        take(&mut self.name, &fragment.name);
        take(&mut self.label, &fragment.label);
        take(&mut self.kind, &fragment.kind);
        take(&mut self.format, &fragment.format);
        take(&mut self.pattern, &fragment.pattern);
        take(&mut self.default, &fragment.default);
        take(&mut self.min, &fragment.min);
        take(&mut self.max, &fragment.max);
        take(&mut self.sanitize, &fragment.sanitize);
        take(&mut self.required, &fragment.required);
        take(&mut self.optional, &fragment.optional);
        take(&mut self.strict, &fragment.strict);
        take(&mut self.properties, &fragment.properties);
        take(&mut self.item_type, &fragment.item_type);
        take(&mut self.append_to_array, &fragment.append_to_array);
        take(&mut self.is_missing, &fragment.is_missing);
    }
}

// Present-but-null is a real default, so this must not go through Option's impl
fn literal_default<'de, D>(deserializer: D) -> Result<Option<DefaultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| Some(DefaultValue::Literal(v)))
}

/// How `pattern` was written
#[derive(Clone)]
pub enum PatternSpec {
    /// Regular expression source, compiled during normalization
    Source(String),
    /// Precompiled expression
    Regex(Regex),
    Predicate(PatternFn),
    /// Anything else found in a JSON description; rejected by the normalizer
    Other(serde_json::Value),
}

impl PatternSpec {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &super::Rule) -> bool + Send + Sync + 'static,
    {
        PatternSpec::Predicate(Arc::new(f))
    }
}

impl fmt::Debug for PatternSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSpec::Source(s) => f.debug_tuple("Source").field(s).finish(),
            PatternSpec::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            PatternSpec::Predicate(_) => f.write_str("Predicate(<callback>)"),
            PatternSpec::Other(v) => f.debug_tuple("Other").field(v).finish(),
        }
    }
}

impl<'de> Deserialize<'de> for PatternSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(source) => PatternSpec::Source(source),
            other => PatternSpec::Other(other),
        })
    }
}

/// How `min`/`max` was written
#[derive(Debug, Clone, PartialEq)]
pub enum BoundSpec {
    Number(f64),
    Date(DateTime<Utc>),
    /// Date text (ISO 8601), parsed during normalization
    Text(String),
}

impl<'de> Deserialize<'de> for BoundSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(BoundSpec::Number)
                .ok_or_else(|| serde::de::Error::custom("bound is not a finite number")),
            serde_json::Value::String(s) => Ok(BoundSpec::Text(s)),
            other => Err(serde::de::Error::custom(format!(
                "bound must be a number or date string, got {}",
                other
            ))),
        }
    }
}

impl From<f64> for BoundSpec {
    fn from(n: f64) -> Self {
        BoundSpec::Number(n)
    }
}

impl From<i64> for BoundSpec {
    fn from(n: i64) -> Self {
        BoundSpec::Number(n as f64)
    }
}

impl From<DateTime<Utc>> for BoundSpec {
    fn from(d: DateTime<Utc>) -> Self {
        BoundSpec::Date(d)
    }
}

/// How `sanitize` was written
#[derive(Clone)]
pub enum SanitizeSpec {
    Flag(bool),
    /// Coercion name, checked during normalization
    Named(String),
    Callback(SanitizeFn),
}

impl SanitizeSpec {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Value, &super::Rule) -> Option<Value> + Send + Sync + 'static,
    {
        SanitizeSpec::Callback(Arc::new(f))
    }
}

impl fmt::Debug for SanitizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanitizeSpec::Flag(b) => f.debug_tuple("Flag").field(b).finish(),
            SanitizeSpec::Named(s) => f.debug_tuple("Named").field(s).finish(),
            SanitizeSpec::Callback(_) => f.write_str("Callback(<callback>)"),
        }
    }
}

impl<'de> Deserialize<'de> for SanitizeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Bool(b) => Ok(SanitizeSpec::Flag(b)),
            serde_json::Value::String(s) => Ok(SanitizeSpec::Named(s)),
            other => Err(serde::de::Error::custom(format!(
                "sanitize must be a boolean or coercion name, got {}",
                other
            ))),
        }
    }
}

/// `required`/`optional` as a flag or as a map of child rules
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PresenceSpec {
    Flag(bool),
    Fields(IndexMap<String, RuleSource>),
}

/// How `isMissing` was written
#[derive(Clone)]
pub enum MissingSpec {
    Flag(bool),
    Sentinels(Vec<Value>),
    Predicate(MissingFn),
}

impl fmt::Debug for MissingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingSpec::Flag(b) => f.debug_tuple("Flag").field(b).finish(),
            MissingSpec::Sentinels(v) => f.debug_tuple("Sentinels").field(v).finish(),
            MissingSpec::Predicate(_) => f.write_str("Predicate(<callback>)"),
        }
    }
}

impl<'de> Deserialize<'de> for MissingSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Bool(b) => Ok(MissingSpec::Flag(b)),
            serde_json::Value::Array(items) => Ok(MissingSpec::Sentinels(
                items.into_iter().map(Value::from).collect(),
            )),
            other => Err(serde::de::Error::custom(format!(
                "isMissing must be a boolean or an array of values, got {}",
                other
            ))),
        }
    }
}
