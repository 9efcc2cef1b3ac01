use rtklink::rtklink::schema::{extract_schema_name, parse_version, validate_name_format};
use rtklink::{SchemaDefinition, SchemaError, SchemaRegistry};

fn registry() -> SchemaRegistry {
    SchemaRegistry::with_builtins().unwrap()
}

#[test]
fn test_valid_state_message_passes() {
    let result = registry()
        .validate(r#"{"schema":"state/1.0","ts":1,"health":"ok"}"#, "state/1.0")
        .unwrap();
    assert!(result.is_valid);
    assert!(result.error_message.is_empty());
}

#[test]
fn test_missing_required_field_flagged_with_path() {
    let result = registry()
        .validate(r#"{"ts":1,"health":"ok"}"#, "state/1.0")
        .unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.error_path, "/schema");
    assert!(result.error_message.contains("schema"));

    let result = registry()
        .validate(r#"{"schema":"state/1.0","ts":1}"#, "state/1.0")
        .unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.error_path, "/health");
}

#[test]
fn test_const_mismatch_flagged() {
    let result = registry()
        .validate(r#"{"schema":"state/2.0","ts":1,"health":"ok"}"#, "state/1.0")
        .unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.error_path, "/schema");
}

#[test]
fn test_malformed_json_reports_parser_offset() {
    let err = registry()
        .validate("{\"schema\": \"state/1.0\",", "state/1.0")
        .unwrap_err();
    match err {
        SchemaError::InvalidJson { line, column, .. } => {
            assert!(line >= 1);
            assert!(column >= 1);
        }
        other => panic!("expected InvalidJson, got {:?}", other),
    }
}

#[test]
fn test_unknown_schema_not_found() {
    let err = registry()
        .validate(r#"{"schema":"x/1.0"}"#, "x/1.0")
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::NotFound {
            name: "x/1.0".to_string()
        }
    );
}

#[test]
fn test_auto_validate_dispatches_on_embedded_schema() {
    let registry = registry();
    let result = registry
        .auto_validate(r#"{"schema":"state/1.0","ts":1,"health":"ok"}"#)
        .unwrap();
    assert!(result.is_valid);

    // Missing or non-string schema field
    assert!(matches!(
        registry.auto_validate(r#"{"ts":1}"#),
        Err(SchemaError::NotFound { .. })
    ));
    assert!(matches!(
        registry.auto_validate(r#"{"schema":42}"#),
        Err(SchemaError::NotFound { .. })
    ));
}

#[test]
fn test_quick_validate() {
    let registry = registry();
    assert!(registry.quick_validate(r#"{"schema":"state/1.0","ts":1,"health":"ok"}"#, "state/1.0"));
    assert!(!registry.quick_validate(r#"{"ts":1}"#, "state/1.0"));
    assert!(!registry.quick_validate("junk", "state/1.0"));
    assert!(!registry.quick_validate(r#"{"ts":1}"#, "missing/1.0"));
}

#[test]
fn test_builtin_lwt_and_command_schemas() {
    let registry = registry();
    assert!(registry.quick_validate(r#"{"status":"offline","ts":5,"reason":"x"}"#, "lwt/1.0"));
    assert!(!registry.quick_validate(r#"{"ts":5}"#, "lwt/1.0"));

    let command = r#"{
        "id": "cmd-1",
        "op": "diagnosis.get",
        "schema": "cmd.diagnosis.get/1.0",
        "args": {"type": "wifi"},
        "ts": 1
    }"#;
    assert!(registry.quick_validate(command, "cmd.diagnosis.get/1.0"));
}

#[test]
fn test_custom_registration_and_validation() {
    let mut registry = registry();
    registry
        .register_custom(SchemaDefinition::new(
            "attr.gateway/1.0",
            "1.0",
            "Gateway attribute snapshot",
            r#"{"required":["schema","ts","model"],"properties":{"schema":{"const":"attr.gateway/1.0"}}}"#,
        ))
        .unwrap();

    assert!(registry.quick_validate(
        r#"{"schema":"attr.gateway/1.0","ts":1,"model":"gw-7"}"#,
        "attr.gateway/1.0"
    ));
    let result = registry
        .validate(r#"{"schema":"attr.gateway/1.0","ts":1}"#, "attr.gateway/1.0")
        .unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.error_path, "/model");
}

#[test]
fn test_duplicate_names_shadow_first_match() {
    let mut registry = SchemaRegistry::new();
    registry
        .register_custom(SchemaDefinition::new(
            "dup/1.0",
            "1.0",
            "strict",
            r#"{"required":["a"]}"#,
        ))
        .unwrap();
    registry
        .register_custom(SchemaDefinition::new("dup/1.0", "1.0", "lax", "{}"))
        .unwrap();

    // First registration wins on lookup
    assert!(!registry.quick_validate(r#"{"b":1}"#, "dup/1.0"));
    assert!(registry.quick_validate(r#"{"a":1}"#, "dup/1.0"));
}

#[test]
fn test_capacity_exhaustion() {
    let mut registry = SchemaRegistry::with_capacity(2);
    registry
        .register_custom(SchemaDefinition::new("a/1.0", "1.0", "", "{}"))
        .unwrap();
    registry
        .register_custom(SchemaDefinition::new("b/1.0", "1.0", "", "{}"))
        .unwrap();
    assert_eq!(
        registry
            .register_custom(SchemaDefinition::new("c/1.0", "1.0", "", "{}"))
            .unwrap_err(),
        SchemaError::Capacity { limit: 2 }
    );
}

#[test]
fn test_schema_name_helpers() {
    assert!(validate_name_format("state/1.0"));
    assert!(!validate_name_format("state"));
    assert!(!validate_name_format("state/one.zero"));

    assert_eq!(parse_version("cmd.diagnosis.get/1.0").unwrap(), (1, 0));
    assert!(parse_version("nope").is_err());

    assert_eq!(
        extract_schema_name(r#"{"schema":"evt.wifi.roam_miss/1.0"}"#).unwrap(),
        "evt.wifi.roam_miss/1.0"
    );
}
