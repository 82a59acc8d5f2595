use anyhow::Result;
use rule_validator::prelude::*;
use rule_validator::rule::PatternSpec;
use rule_validator::{ConfigError, InputValidator, RuleLibrary, ValidationConfig};
use serde_json::json;
use test_case::test_case;

fn rule(spec: serde_json::Value) -> Result<Rule> {
    Ok(normalize_rule(&RuleSource::from_value(spec)?)?)
}

#[test]
fn test_integer_round_trip() -> Result<()> {
    let rule = rule(json!({ "name": "count", "type": "integer", "min": 5, "max": 10 }))?;

    let outcome = validate(Some(&Value::from(8)), &rule);
    assert_eq!(outcome.value, Some(Value::from(8)));
    assert!(outcome.errors.is_empty());

    let outcome = validate(Some(&Value::from(42)), &rule);
    assert_eq!(outcome.value, None);
    assert_eq!(
        serde_json::to_value(&outcome.errors)?,
        json!([{ "key": "count", "type": "max", "params": { "max": 10 } }])
    );
    Ok(())
}

#[test]
fn test_object_default_scenario() -> Result<()> {
    let rule = rule(json!({
        "type": "object",
        "properties": {
            "a": { "type": "integer", "min": 5, "max": 10 },
            "e": {
                "type": "number", "min": 5, "max": 100,
                "strict": true, "required": true, "default": 11.3
            }
        }
    }))?;

    let outcome = validate(Some(&Value::from(json!({ "a": 8 }))), &rule);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value, Some(Value::from(json!({ "a": 8, "e": 11.3 }))));
    Ok(())
}

#[test_case(json!({ "type": "string", "min": 2, "sanitize": true }), json!("  abc ") ; "string")]
#[test_case(json!({ "type": "integer", "sanitize": true }), json!("7.5") ; "integer")]
#[test_case(json!({ "type": "boolean", "sanitize": true }), json!("TRUE") ; "boolean")]
#[test_case(json!({ "type": "date", "sanitize": true }), json!("2024-03-01") ; "date")]
#[test_case(json!({ "type": "object", "properties": { "n": "posInt", "s": "title" } }), json!({ "n": "3", "s": "x", "z": 1 }) ; "object")]
#[test_case(json!({ "type": "array", "itemType": { "type": "number", "sanitize": true } }), json!(["1.5", 2]) ; "array")]
#[test_case(json!({ "type": "number", "sanitize": "floor" }), json!("8.7") ; "number floor text")]
#[test_case(json!({ "type": "integer", "sanitize": "floor" }), json!("8.7") ; "integer floor text")]
#[test_case(json!({ "type": "number", "sanitize": "ceil" }), json!(8.2) ; "number ceil")]
fn test_validation_is_idempotent(spec: serde_json::Value, input: serde_json::Value) -> Result<()> {
    let rule = rule(spec)?;

    let first = validate(Some(&Value::from(input)), &rule);
    assert!(first.is_valid(), "first pass failed: {:?}", first.errors);
    let output = first.value.clone();

    let second = validate(output.as_ref(), &rule);
    assert!(second.is_valid());
    assert_eq!(second.value, output);
    Ok(())
}

#[test_case(json!({ "type": "string", "default": "" }), json!("") ; "empty string")]
#[test_case(json!({ "type": "number", "default": 0 }), json!(0) ; "zero")]
#[test_case(json!({ "type": "boolean", "required": true, "default": false }), json!(false) ; "false")]
#[test_case(json!({ "type": "object", "default": { "k": [1] } }), json!({ "k": [1] }) ; "object")]
fn test_default_substitution(spec: serde_json::Value, expected: serde_json::Value) -> Result<()> {
    let rule = rule(spec)?;
    let outcome = validate(None, &rule);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.value, Some(Value::from(expected)));
    Ok(())
}

#[test_case(json!("text") ; "string")]
#[test_case(json!(3) ; "number")]
#[test_case(json!({ "a": 1 }) ; "object")]
fn test_strict_gate(input: serde_json::Value) -> Result<()> {
    let rule = rule(json!({ "name": "secret", "type": "integer", "strict": true }))?;
    let outcome = validate(Some(&Value::from(input)), &rule);
    assert_eq!(
        outcome.errors,
        vec![ValidationError::new("secret", ErrorKind::NotAllowed)]
    );
    Ok(())
}

#[test_case(0.0 ; "zero")]
#[test_case(5.0 ; "whole")]
#[test_case(-2.5 ; "fraction")]
fn test_numeric_min_bound(m: f64) -> Result<()> {
    let rule = rule(json!({ "name": "n", "type": "number", "min": m }))?;

    let below = validate(Some(&Value::from(m - 1.0)), &rule);
    assert_eq!(below.errors.len(), 1);
    assert_eq!(below.errors[0].kind, ErrorKind::Min);
    assert_eq!(below.errors[0].param("min"), Some(&Value::from(m)));

    let at = validate(Some(&Value::from(m)), &rule);
    assert!(at.errors.iter().all(|e| e.kind != ErrorKind::Min));
    Ok(())
}

#[test]
fn test_path_qualification() -> Result<()> {
    let root = rule(json!({ "type": "object", "required": { "b": "string" } }))?;
    let outcome = validate(Some(&Value::from(json!({}))), &root);
    assert_eq!(outcome.errors[0].key, "b");

    let nested = rule(json!({
        "name": "form",
        "type": "object",
        "properties": {
            "address": { "type": "object", "required": { "b": "string" } }
        }
    }))?;
    let outcome = validate(Some(&Value::from(json!({ "address": {} }))), &nested);
    assert!(outcome.errors.iter().any(|e| e.key.ends_with(".b")));
    assert_eq!(outcome.errors[0].key, "form.address.b");
    Ok(())
}

#[test]
fn test_input_changeset() -> Result<()> {
    let mut validator = rule_validator::input();
    validator.reference(
        [("title".to_string(), Value::from("Old"))]
            .into_iter()
            .collect(),
    );

    validator
        .input("  ok  ")
        .name("greeting")
        .validate(RuleSource::from_value(json!({ "type": "string", "min": 2 }))?)?
        .input(" Old ")
        .name("title")
        .validate("title")?
        .input("12")
        .name("count")
        .validate("posInt")?;

    assert!(!validator.has_errors());
    let changes = validator.into_result()?;
    assert_eq!(
        serde_json::to_value(&changes)?,
        json!({ "greeting": "ok", "count": "12" })
    );
    Ok(())
}

#[test]
fn test_input_errors_and_alternation() -> Result<()> {
    let mut validator = InputValidator::new();
    validator
        .input("jo")
        .name("contact")
        .validate_any(["email", "username"])?
        .input("")
        .name("mandatory")
        .validate(RuleSource::from_value(json!({ "type": "string", "required": true }))?)?;

    assert_eq!(validator.changes().get("contact"), Some(&Value::from("jo")));
    assert_eq!(
        validator.errors(),
        &[ValidationError::new("mandatory", ErrorKind::Missing)]
    );
    assert!(validator.into_result().is_err());
    Ok(())
}

#[test]
fn test_response_adapter_with_caller_library() -> Result<()> {
    let mut validator = rule_validator::response();
    validator.add_rule_library([("slug", {
        let mut spec = RuleSpec::of_type("string");
        spec.pattern = Some(PatternSpec::Source("^[a-z-]+$".to_string()));
        spec
    })]);

    let rule = RuleSource::from_value(json!({
        "name": "page",
        "type": "object",
        "strict": true,
        "required": true,
        "properties": { "slug": "slug", "views": "posInt" }
    }))?;

    let ok = validator.validate(&Value::from(json!({ "slug": "about-us", "views": 3 })), &rule)?;
    assert!(ok.is_valid());

    let bad = validator.validate(&Value::from(json!({ "slug": "About", "extra": 1 })), &rule)?;
    let wire = serde_json::to_value(&bad.errors)?;
    assert_eq!(
        wire,
        json!([
            { "key": "page.slug", "type": "invalid" },
            { "key": "page.extra", "type": "notAllowed" }
        ])
    );
    Ok(())
}

#[test]
fn test_configuration_errors_surface_early() -> Result<()> {
    let err = normalize_rule(&RuleSource::from("string|number")).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRule(_)));

    let err = normalize_rule(&RuleSource::from_value(json!({ "type": "string", "pattern": "(" }))?)
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPattern { .. }));

    let shallow = ValidationConfig {
        max_depth: 1,
        ..ValidationConfig::default()
    };
    let library = RuleLibrary::new();
    let deep = RuleSource::from_value(json!({
        "type": "object",
        "properties": { "a": { "type": "object", "properties": { "b": "string" } } }
    }))?;
    let err = rule_validator::Normalizer::new(&library, &shallow)
        .normalize(&deep)
        .unwrap_err();
    assert!(matches!(err, ConfigError::DepthExceeded(1)));
    Ok(())
}
