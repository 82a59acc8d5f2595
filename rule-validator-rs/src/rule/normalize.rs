//! Rule normalization
//!
//! Turns a [`RuleSource`] into a canonical [`Rule`]: resolves library names
//! and `format` references, compiles patterns, parses bounds and recurses
//! into `properties`, `itemType` and the `required`/`optional` child maps.
//! All rule problems surface here as [`ConfigError`], before any value is
//! looked at.

use super::library::RuleLibrary;
use super::source::{
    BoundSpec, MissingSpec, PatternSpec, PresenceSpec, RuleSource, RuleSpec, SanitizeSpec,
};
use super::{Bound, MissingCheck, Pattern, Rule, RuleType, Sanitize};
use crate::errors::{ConfigError, ConfigResult};
use crate::sanitizers;
use crate::{default_config, ValidationConfig};
use log::{debug, trace, warn};
use regex::Regex;
use std::borrow::Cow;

/// Normalize with the built-in library and default configuration
pub fn normalize_rule(source: &RuleSource) -> ConfigResult<Rule> {
    let library = RuleLibrary::default();
    Normalizer::new(&library, &default_config()).normalize(source)
}

/// Resolves rule sources against a library
#[derive(Debug)]
pub struct Normalizer<'a> {
    library: &'a RuleLibrary,
    max_depth: usize,
}

impl<'a> Normalizer<'a> {
    pub fn new(library: &'a RuleLibrary, config: &ValidationConfig) -> Self {
        Self {
            library,
            max_depth: config.max_depth,
        }
    }

    /// Build a canonical rule from a source
    pub fn normalize(&self, source: &RuleSource) -> ConfigResult<Rule> {
        self.normalize_at(source, 0)
    }

    fn normalize_at(&self, source: &RuleSource, depth: usize) -> ConfigResult<Rule> {
        if depth > self.max_depth {
            return Err(ConfigError::DepthExceeded(self.max_depth));
        }

        match source {
            RuleSource::Name(name) => self.from_name(name, depth),
            RuleSource::Spec(spec) => self.from_spec(spec, depth),
        }
    }

    fn from_name(&self, name: &str, depth: usize) -> ConfigResult<Rule> {
        if let Some(fragment) = self.library.resolve(name) {
            debug!("Resolved rule '{}' from library", name);
            let mut spec = fragment.clone();
            spec.format.get_or_insert_with(|| name.to_string());
            return self.from_spec(&spec, depth);
        }

        let kinds = name
            .split('|')
            .map(str::parse::<RuleType>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ConfigError::InvalidType {
                name: name.to_string(),
                valid: RuleType::valid_names(),
            })?;

        match kinds.as_slice() {
            [kind] => Rule::of(*kind).into_checked(),
            _ => Err(ConfigError::InvalidRule(format!(
                "type union '{}' cannot be used as a rule",
                name
            ))),
        }
    }

    fn from_spec(&self, spec: &RuleSpec, depth: usize) -> ConfigResult<Rule> {
        let spec = self.merge_format(spec);

        let kind = spec
            .kind
            .as_deref()
            .ok_or_else(|| ConfigError::InvalidRule("type is not set".to_string()))?
            .parse::<RuleType>()?;
        trace!("Normalizing {} rule {:?}", kind, spec.name);

        let mut rule = Rule::of(kind);
        rule.name = spec.name.clone();
        rule.label = spec.label.clone();
        rule.format = spec.format.clone();
        rule.pattern = spec.pattern.as_ref().map(compile_pattern).transpose()?;
        rule.default = spec.default.clone();
        rule.min = spec.min.as_ref().map(|b| parse_bound("min", b)).transpose()?;
        rule.max = spec.max.as_ref().map(|b| parse_bound("max", b)).transpose()?;
        rule.sanitize = spec.sanitize.as_ref().map(parse_sanitize).transpose()?;
        rule.strict = spec.strict.unwrap_or(false);
        rule.append_to_array = spec.append_to_array.unwrap_or(false);
        rule.is_missing = spec.is_missing.as_ref().map(missing_check);

        if let Some(PresenceSpec::Flag(flag)) = &spec.required {
            rule.required = *flag;
        }
        if let Some(PresenceSpec::Flag(flag)) = &spec.optional {
            rule.optional = *flag;
        }

        if let Some(properties) = &spec.properties {
            for (key, child) in properties {
                let child = self.child(key, child, depth)?;
                rule.properties.insert(key.clone(), child);
            }
        }
        self.fold_presence(&mut rule, spec.required.as_ref(), depth, true)?;
        self.fold_presence(&mut rule, spec.optional.as_ref(), depth, false)?;

        if let Some(item) = &spec.item_type {
            rule.item_type = Some(Box::new(self.normalize_at(item, depth + 1)?));
        }

        rule.into_checked()
    }

    /// Apply the library fragment named by `format`, if any
    fn merge_format<'s>(&self, spec: &'s RuleSpec) -> Cow<'s, RuleSpec> {
        let Some(format) = spec.format.as_deref() else {
            return Cow::Borrowed(spec);
        };
        match self.library.resolve(format) {
            Some(fragment) => {
                debug!("Merging library format '{}'", format);
                let mut merged = spec.clone();
                merged.overlay(fragment);
                Cow::Owned(merged)
            }
            None => {
                warn!("Rule format '{}' not found in library, ignoring", format);
                Cow::Borrowed(spec)
            }
        }
    }

    fn child(&self, key: &str, source: &RuleSource, depth: usize) -> ConfigResult<Rule> {
        let mut child = self.normalize_at(source, depth + 1)?;
        if child.name.is_none() {
            child.name = Some(key.to_string());
        }
        if child.label.is_none() {
            child.label = child.name.clone();
        }
        Ok(child)
    }

    fn fold_presence(
        &self,
        rule: &mut Rule,
        presence: Option<&PresenceSpec>,
        depth: usize,
        required: bool,
    ) -> ConfigResult<()> {
        let Some(PresenceSpec::Fields(fields)) = presence else {
            return Ok(());
        };

        for (key, source) in fields {
            let mut child = self.child(key, source, depth)?;
            if required {
                child.required = true;
            } else {
                child.optional = true;
            }
            rule.properties.insert(key.clone(), child);
        }
        Ok(())
    }
}

fn compile_pattern(spec: &PatternSpec) -> ConfigResult<Pattern> {
    match spec {
        PatternSpec::Source(source) => Regex::new(source)
            .map(Pattern::Regex)
            .map_err(|source_err| ConfigError::InvalidPattern {
                pattern: source.clone(),
                source: source_err,
            }),
        PatternSpec::Regex(re) => Ok(Pattern::Regex(re.clone())),
        PatternSpec::Predicate(f) => Ok(Pattern::Predicate(f.clone())),
        PatternSpec::Other(value) => Err(ConfigError::InvalidRule(format!(
            "pattern must be a regular expression or predicate, got {}",
            value
        ))),
    }
}

fn parse_bound(field: &'static str, spec: &BoundSpec) -> ConfigResult<Bound> {
    match spec {
        BoundSpec::Number(n) => Ok(Bound::Number(*n)),
        BoundSpec::Date(d) => Ok(Bound::Date(*d)),
        BoundSpec::Text(text) => sanitizers::parse_date_text(text)
            .map(Bound::Date)
            .ok_or_else(|| ConfigError::InvalidBound {
                field,
                value: text.clone(),
            }),
    }
}

fn parse_sanitize(spec: &SanitizeSpec) -> ConfigResult<Sanitize> {
    Ok(match spec {
        SanitizeSpec::Flag(flag) => Sanitize::Enabled(*flag),
        SanitizeSpec::Named(name) => Sanitize::Coerce(name.parse()?),
        SanitizeSpec::Callback(f) => Sanitize::Callback(f.clone()),
    })
}

fn missing_check(spec: &MissingSpec) -> MissingCheck {
    match spec {
        MissingSpec::Flag(flag) => MissingCheck::Always(*flag),
        MissingSpec::Sentinels(values) => MissingCheck::Sentinels(values.clone()),
        MissingSpec::Predicate(f) => MissingCheck::Predicate(f.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Coercion;
    use serde_json::json;

    fn normalize(json: serde_json::Value) -> ConfigResult<Rule> {
        normalize_rule(&RuleSource::from_value(json)?)
    }

    #[test]
    fn test_library_name() {
        let rule = normalize(json!("posInt")).unwrap();
        assert_eq!(rule.kind(), RuleType::String);
        assert_eq!(rule.format(), Some("posInt"));
        assert_eq!(rule.coercion(), Some(Coercion::Integer));
        assert!(rule.pattern().is_some());
    }

    #[test]
    fn test_primitive_name() {
        let rule = normalize(json!("boolean")).unwrap();
        assert_eq!(rule.kind(), RuleType::Boolean);
        assert_eq!(rule.name(), None);
    }

    #[test]
    fn test_unknown_name_is_invalid_type() {
        let err = normalize(json!("string|frobnicate")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidType { ref name, .. } if name == "string|frobnicate"));
    }

    #[test]
    fn test_union_name_is_rejected() {
        let err = normalize(json!("string|number")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule(_)));
    }

    #[test]
    fn test_missing_type() {
        let err = normalize(json!({ "name": "a" })).unwrap_err();
        assert_eq!(err.to_string(), "Invalid validator rule: type is not set");
    }

    #[test]
    fn test_bad_pattern() {
        assert!(matches!(
            normalize(json!({ "type": "string", "pattern": "(" })),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            normalize(json!({ "type": "string", "pattern": { "x": 1 } })),
            Err(ConfigError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_unknown_coercion() {
        assert!(matches!(
            normalize(json!({ "type": "number", "sanitize": "lowercase" })),
            Err(ConfigError::UnknownCoercion(_))
        ));
    }

    #[test]
    fn test_format_merges_library_fragment() {
        let rule = normalize(json!({ "name": "contact", "format": "email", "type": "number" })).unwrap();
        assert_eq!(rule.kind(), RuleType::String);
        assert_eq!(rule.label(), Some("contact"));
        assert!(rule.pattern().is_some());
    }

    #[test]
    fn test_unresolved_format_is_ignored() {
        let rule = normalize(json!({ "format": "nothing", "type": "number" })).unwrap();
        assert_eq!(rule.kind(), RuleType::Number);
    }

    #[test]
    fn test_children_named_and_flagged() {
        let rule = normalize(json!({
            "type": "object",
            "label": "root",
            "properties": { "a": { "type": "integer" } },
            "required": { "b": "string" },
            "optional": { "c": { "type": "date", "label": "Start" } }
        }))
        .unwrap();

        let keys: Vec<&String> = rule.properties().keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);

        let b = &rule.properties()["b"];
        assert_eq!(b.name(), Some("b"));
        assert!(b.is_required());
        assert!(!b.is_optional());

        let c = &rule.properties()["c"];
        assert!(c.is_optional());
        assert_eq!(c.label(), Some("Start"));
        assert_eq!(c.name(), Some("c"));
    }

    #[test]
    fn test_item_type_alias() {
        let rule = normalize(json!({ "type": "array", "arrayType": "integer" })).unwrap();
        assert_eq!(rule.item_type().map(Rule::kind), Some(RuleType::Integer));
    }

    #[test]
    fn test_date_bounds() {
        let rule = normalize(json!({ "type": "date", "min": "2020-01-01", "max": 1_700_000_000_000i64 })).unwrap();
        assert!(matches!(rule.min(), Some(Bound::Date(_))));
        assert!(matches!(rule.max(), Some(Bound::Number(_))));

        assert!(matches!(
            normalize(json!({ "type": "date", "min": "yesterday" })),
            Err(ConfigError::InvalidBound { field: "min", .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut rule = json!({ "type": "integer" });
        for _ in 0..34 {
            rule = json!({ "type": "object", "properties": { "x": rule } });
        }
        assert!(matches!(normalize(rule), Err(ConfigError::DepthExceeded(32))));
    }

    #[test]
    fn test_caller_library() {
        let mut library = RuleLibrary::new();
        library
            .add_json_entries(json!({ "percent": { "type": "number", "min": 0, "max": 100 } }))
            .unwrap();
        let normalizer = Normalizer::new(&library, &default_config());

        let rule = normalizer.normalize(&RuleSource::from("percent")).unwrap();
        assert_eq!(rule.kind(), RuleType::Number);
        assert_eq!(rule.max(), Some(&Bound::Number(100.0)));
    }
}
