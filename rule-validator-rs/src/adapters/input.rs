//! Input adapter
//!
//! UI input always arrives as text, so every raw value is rendered to a
//! string and trimmed before validation, and the empty string counts as no
//! value. Validated values are collected into a changeset keyed by field
//! name. With a reference document set, only values that differ from the
//! reference are recorded.

use crate::engine::{Engine, Presence};
use crate::errors::{ConfigError, ConfigResult, ValidationError, ValidationErrors};
use crate::rule::{Normalizer, Rule, RuleLibrary, RuleSource, RuleSpec};
use crate::sanitizers::{
    chain_sanitizers, normalize_unicode, to_text, trim_whitespace, SanitizeResult,
};
use crate::value::{Map, Value};
use crate::{default_config, ValidationConfig};
use indexmap::map::Entry;
use log::debug;

/// Collects validated form fields into a changeset
#[derive(Debug, Clone)]
pub struct InputValidator {
    changes: Map,
    reference: Option<Map>,
    errors: Vec<ValidationError>,
    library: RuleLibrary,
    config: ValidationConfig,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::with_config(default_config())
    }
}

impl InputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self {
            changes: Map::new(),
            reference: None,
            errors: Vec::new(),
            library: RuleLibrary::new(),
            config,
        }
    }

    /// Start from an existing changeset
    pub fn with_changes(changes: Map) -> Self {
        Self {
            changes,
            ..Self::default()
        }
    }

    /// Add named rules resolvable by every later validation
    pub fn add_rule_library<I, K>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, RuleSpec)>,
        K: Into<String>,
    {
        self.library.add_entries(entries);
        self
    }

    /// Only record values that differ from this document
    pub fn reference(&mut self, doc: Map) -> &mut Self {
        self.reference = Some(doc);
        self
    }

    /// Begin validating one raw value; absent input may be passed as `Value::Null`
    pub fn input<V: Into<Value>>(&mut self, value: V) -> InputField<'_> {
        InputField {
            validator: self,
            raw: value.into(),
            name: None,
            extract: None,
            keep_raw: false,
        }
    }

    /// Reset changeset, reference and errors
    pub fn clear(&mut self) -> &mut Self {
        self.changes.clear();
        self.reference = None;
        self.errors.clear();
        self
    }

    pub fn changes(&self) -> &Map {
        &self.changes
    }

    pub fn reference_doc(&self) -> Option<&Map> {
        self.reference.as_ref()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The changeset, or every error collected so far
    pub fn into_result(self) -> Result<Map, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(self.changes)
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }

    fn record(&mut self, name: &str, value: Value, append: bool) {
        if let Some(reference) = &self.reference {
            if reference.get(name) == Some(&value) {
                debug!("Field '{}' unchanged from reference, not recording", name);
                return;
            }
        }

        if !append {
            self.changes.insert(name.to_string(), value);
            return;
        }

        match self.changes.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(Value::Array(vec![value]));
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(items) => items.push(value),
                existing => {
                    let previous = std::mem::replace(existing, Value::Null);
                    *existing = Value::Array(vec![previous, value]);
                }
            },
        }
    }

    /// Render a raw value as prepared text
    fn prepare_text(&self, raw: &Value) -> ConfigResult<Value> {
        let text = match raw {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => {
                return Err(ConfigError::ComplexInput(raw.type_name()))
            }
            scalar => to_text(scalar),
        };

        let mut steps: Vec<fn(String) -> SanitizeResult<String>> = Vec::new();
        if self.config.trim_input {
            steps.push(|s| trim_whitespace(&s));
        }
        if self.config.normalize_unicode {
            steps.push(|s| normalize_unicode(&s));
        }

        let prepared = chain_sanitizers(text, steps);
        if let Some(details) = &prepared.details {
            debug!("Prepared input: {}", details);
        }
        Ok(Value::String(prepared.sanitized))
    }
}

/// One raw value on its way into an [`InputValidator`]
pub struct InputField<'a> {
    validator: &'a mut InputValidator,
    raw: Value,
    name: Option<String>,
    extract: Option<Box<dyn FnOnce(&Value) -> Value + 'a>>,
    keep_raw: bool,
}

impl<'a> InputField<'a> {
    /// Changeset key; defaults to the rule's name
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Derive the value to validate from the raw input; the result is used as is
    pub fn extract_with<F>(mut self, extract: F) -> Self
    where
        F: FnOnce(&Value) -> Value + 'a,
    {
        self.extract = Some(Box::new(extract));
        self
    }

    /// Validate the raw value without text coercion
    pub fn raw(mut self) -> Self {
        self.keep_raw = true;
        self
    }

    /// Validate against a rule source
    pub fn validate<R: Into<RuleSource>>(self, rule: R) -> ConfigResult<&'a mut InputValidator> {
        self.validate_any([rule])
    }

    /// Validate against an already normalized rule
    pub fn validate_rule(self, rule: &Rule) -> ConfigResult<&'a mut InputValidator> {
        let (validator, value) = self.prepare()?;
        commit(validator, value, std::slice::from_ref(rule))
    }

    /// Try each rule in turn until one passes
    ///
    /// When none passes, the errors of the last attempt are recorded.
    pub fn validate_any<I, R>(self, rules: I) -> ConfigResult<&'a mut InputValidator>
    where
        I: IntoIterator<Item = R>,
        R: Into<RuleSource>,
    {
        let rules = {
            let normalizer = Normalizer::new(&self.validator.library, &self.validator.config);
            rules
                .into_iter()
                .map(|source| normalizer.normalize(&source.into()))
                .collect::<ConfigResult<Vec<_>>>()?
        };
        let (validator, value) = self.prepare()?;
        commit(validator, value, &rules)
    }

    fn prepare(self) -> ConfigResult<(&'a mut InputValidator, PreparedValue)> {
        let value = match self.extract {
            Some(extract) => extract(&self.raw),
            None if self.keep_raw => self.raw,
            None => self.validator.prepare_text(&self.raw)?,
        };
        Ok((
            self.validator,
            PreparedValue {
                value,
                name: self.name,
            },
        ))
    }
}

struct PreparedValue {
    value: Value,
    name: Option<String>,
}

fn commit<'a>(
    validator: &'a mut InputValidator,
    prepared: PreparedValue,
    rules: &[Rule],
) -> ConfigResult<&'a mut InputValidator> {
    if rules.is_empty() {
        return Err(ConfigError::InvalidRule("no rules given".to_string()));
    }

    let engine = Engine::with_presence(Presence::NonEmpty);
    let mut last = None;

    for rule in rules {
        let name = prepared
            .name
            .clone()
            .or_else(|| rule.name().map(str::to_string))
            .ok_or(ConfigError::UnnamedField)?;
        let key = rule.label().unwrap_or(&name).to_string();

        let outcome = engine.apply(Some(&prepared.value), rule, &key);
        let passed = outcome.is_valid();
        last = Some((name, rule.appends_to_array(), outcome));
        if passed {
            break;
        }
    }

    if let Some((name, append, outcome)) = last {
        if outcome.has_errors() {
            debug!("Field '{}' failed with {} errors", name, outcome.errors.len());
            validator.errors.extend(outcome.errors);
        } else if let Some(value) = outcome.value {
            validator.record(&name, value, append);
        }
    }

    Ok(validator)
}
