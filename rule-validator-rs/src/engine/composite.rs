//! Handlers for objects and arrays
//!
//! Both recurse through the engine once per declared property or element.
//! Child errors are qualified with this node's key so that a failure deep in
//! a document reports as `parent.child.grandchild`.

use super::{fallback, Engine};
use crate::errors::{ErrorKind, ValidationError, ValidationOutcome};
use crate::rule::Rule;
use crate::value::{Map, Value};
use log::trace;

fn as_object(v: &Value) -> Option<Value> {
    v.is_object().then(|| v.clone())
}

pub(super) fn object(engine: &Engine, value: &Value, rule: &Rule, key: &str) -> ValidationOutcome {
    let map = match value {
        Value::Object(map) => map,
        other => {
            if let Some(sanitize) = rule.sanitize_callback() {
                if let Some(coerced) = sanitize(other, rule) {
                    return ValidationOutcome::with_value(coerced);
                }
            }
            return fallback(other, rule, key, ErrorKind::Invalid, as_object).into();
        }
    };

    if rule.properties().is_empty() && !rule.is_strict() {
        return ValidationOutcome::with_value(value.clone());
    }

    let mut output = Map::new();
    let mut errors = Vec::new();

    for (name, child_rule) in rule.properties() {
        let child_key = child_rule.label().unwrap_or(name);
        trace!("Validating property '{}' of '{}'", name, key);

        let child = engine.apply_child(map.get(name), child_rule, child_key);
        if child.has_errors() {
            errors.extend(child.errors.into_iter().map(|e| e.prefixed(key)));
        } else if let Some(v) = child.value {
            output.insert(name.clone(), v);
        }
    }

    if rule.is_strict() {
        for extra in map.keys().filter(|k| !rule.properties().contains_key(*k)) {
            errors.push(ValidationError::new(extra.as_str(), ErrorKind::NotAllowed).prefixed(key));
        }
    }

    if errors.is_empty() {
        ValidationOutcome::with_value(Value::Object(output))
    } else {
        ValidationOutcome {
            value: None,
            errors,
        }
    }
}

pub(super) fn array(engine: &Engine, value: &Value, rule: &Rule, key: &str) -> ValidationOutcome {
    let Value::Array(items) = value else {
        return ValidationOutcome::error(ValidationError::new(key, ErrorKind::Invalid));
    };
    let Some(item_rule) = rule.item_type() else {
        return ValidationOutcome::with_value(value.clone());
    };

    let mut output = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        let child = engine.apply_child(Some(item), item_rule, &idx.to_string());
        if child.has_errors() {
            errors.extend(child.errors.into_iter().map(|e| e.prefixed(key)));
        } else if let Some(v) = child.value {
            output.push(v);
        }
    }

    if errors.is_empty() {
        ValidationOutcome::with_value(Value::Array(output))
    } else {
        ValidationOutcome {
            value: None,
            errors,
        }
    }
}
