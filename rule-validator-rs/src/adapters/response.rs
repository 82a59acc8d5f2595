//! Response adapter

use crate::engine::Engine;
use crate::errors::{ConfigResult, ValidationOutcome};
use crate::rule::{Normalizer, Rule, RuleLibrary, RuleSource, RuleSpec};
use crate::value::Value;
use crate::{default_config, ValidationConfig};

/// Validates structured payloads against a single rule, without coercion to text
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    library: RuleLibrary,
    config: ValidationConfig,
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::with_config(default_config())
    }
}

impl ResponseValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self {
            library: RuleLibrary::new(),
            config,
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

    /// Normalize `rule` and validate `value` against it
    pub fn validate(&self, value: &Value, rule: &RuleSource) -> ConfigResult<ValidationOutcome> {
        let rule = Normalizer::new(&self.library, &self.config).normalize(rule)?;
        Ok(self.validate_rule(value, &rule))
    }

    /// Validate against an already normalized rule
    pub fn validate_rule(&self, value: &Value, rule: &Rule) -> ValidationOutcome {
        Engine::new().validate(Some(value), rule)
    }
}
