//! Named rule library
//!
//! Maps symbolic names (`"email"`, `"posInt"`) to rule fragments. Callers
//! add their own entries; lookups fall back to the built-in table.

use super::source::{PatternSpec, RuleSpec, SanitizeSpec};
use crate::errors::ConfigResult;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::HashMap;

const EMAIL_PATTERN: &str = r##"^(?:[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")@(?:(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?|[a-zA-Z0-9-]*[a-zA-Z0-9]:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])$"##;

lazy_static! {
    static ref BUILTIN_LIBRARY: HashMap<&'static str, RuleSpec> = {
        let mut m = HashMap::new();
        m.insert("url", string_rule(r"^https?://", None));
        m.insert("email", string_rule(EMAIL_PATTERN, Some("string")));
        m.insert("dimension", string_rule(r"^\d{1,4}$", None));
        m.insert("aspect", string_rule(r"^\d+:\d+$", None));
        m.insert("title", string_rule(r"^.+$", None));
        m.insert("filename", string_rule(r"^[^/]+$", None));
        m.insert("fullname", string_rule(r"^.+$", None));
        m.insert("company", string_rule(r"^.+$", None));
        m.insert("subject", string_rule(r"^.+$", None));
        m.insert("description", string_rule(r"^.+$", None));
        m.insert("password", string_rule(r"^.{6,}$", None));
        m.insert("label", string_rule(r"^[a-zA-Z\-\.\s]+$", None));
        m.insert("username", string_rule(r"^[a-z0-9]{2,}$", None));
        m.insert("interaction", string_rule(r"^(none|url|clickplay)$", None));
        m.insert("globalPerm", string_rule(r"^(none|globalView|globalAdmin)$", None));
        m.insert("streamStatus", string_rule(r"^(upcoming|live|completed)$", None));
        m.insert("usertoken", string_rule(r"^.*$", None));
        m.insert("externalId", string_rule(r"^.*$", None));
        m.insert("posInt", string_rule(r"^\d+$", Some("integer")));
        m.insert("posIntAsString", string_rule(r"^\d+$", Some("string")));
        m.insert("signedInt", string_rule(r"^(\+|-)?\d+$", Some("integer")));
        m
    };
}

fn string_rule(pattern: &str, sanitize: Option<&str>) -> RuleSpec {
    RuleSpec {
        pattern: Some(PatternSpec::Regex(Regex::new(pattern).unwrap())),
        sanitize: sanitize.map(|s| SanitizeSpec::Named(s.to_string())),
        ..RuleSpec::of_type("string")
    }
}

/// Lookup from symbolic names to rule fragments
#[derive(Debug, Clone, Default)]
pub struct RuleLibrary {
    entries: IndexMap<String, RuleSpec>,
}

impl RuleLibrary {
    /// Library with only the built-in entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace caller entries
    pub fn add_entries<I, K>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, RuleSpec)>,
        K: Into<String>,
    {
        for (name, spec) in entries {
            let name = name.into();
            debug!("Adding rule library entry '{}'", name);
            self.entries.insert(name, spec);
        }
        self
    }

    /// Add caller entries from a JSON object of name to rule description
    pub fn add_json_entries(&mut self, json: serde_json::Value) -> ConfigResult<&mut Self> {
        let entries: IndexMap<String, RuleSpec> = serde_json::from_value(json)?;
        Ok(self.add_entries(entries))
    }

    /// Look up a name, caller entries first
    pub fn resolve(&self, name: &str) -> Option<&RuleSpec> {
        self.entries
            .get(name)
            .or_else(|| BUILTIN_LIBRARY.get(name))
    }

    /// Whether a name resolves to a library entry
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Number of caller entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
