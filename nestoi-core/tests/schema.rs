use nestoi_core::schema::{FieldDescriptor, FieldType, SchemaRegistry, ValidationRule};
use nestoi_core::NestoiError;
use serde_json::json;

#[test]
fn describe_string_rule() {
    let rule = ValidationRule::string()
        .min(3)
        .max(30)
        .example("alice")
        .description("Login name");
    let d = rule.describe();
    assert_eq!(d.field_type, FieldType::String);
    assert_eq!(d.example, Some(json!("alice")));
    assert_eq!(d.description.as_deref(), Some("Login name"));
    assert_eq!(d.min, Some(3.0));
    assert_eq!(d.max, Some(30.0));
    assert!(d.valid.is_none());
}

#[test]
fn integer_is_described_as_number() {
    let d = ValidationRule::integer().min(1).describe();
    assert_eq!(d.field_type, FieldType::Number);
    assert_eq!(d.min, Some(1.0));
}

#[test]
fn enum_values_become_valid_strings() {
    let d = ValidationRule::string().one_of(["admin", "user"]).describe();
    assert_eq!(d.valid, Some(vec!["admin".to_string(), "user".to_string()]));

    let d = ValidationRule::integer().one_of([1, 2]).describe();
    assert_eq!(d.valid, Some(vec!["1".to_string(), "2".to_string()]));
}

#[test]
fn nullable_type_list_uses_first_non_null() {
    let d = ValidationRule::new(json!({ "type": ["null", "boolean"] })).describe();
    assert_eq!(d.field_type, FieldType::Boolean);
}

#[test]
fn untyped_rules_are_inferred() {
    let d = ValidationRule::new(json!({ "properties": { "a": {} } })).describe();
    assert_eq!(d.field_type, FieldType::Object);

    let d = ValidationRule::new(json!({ "items": { "type": "string" } })).describe();
    assert_eq!(d.field_type, FieldType::Array);

    let d = ValidationRule::new(json!({ "examples": ["x", "y"] })).describe();
    assert_eq!(d.field_type, FieldType::String);
    assert_eq!(d.example, Some(json!("x")));
}

#[test]
fn array_bounds_use_item_counts() {
    let rule = ValidationRule::array(ValidationRule::string()).min(1).max(5);
    assert_eq!(rule.schema()["minItems"], json!(1));
    assert_eq!(rule.schema()["maxItems"], json!(5));
    let d = rule.describe();
    assert_eq!(d.field_type, FieldType::Array);
    assert_eq!((d.min, d.max), (Some(1.0), Some(5.0)));
}

#[test]
fn fallback_descriptor_serializes_as_plain_string_type() {
    let value = serde_json::to_value(FieldDescriptor::fallback()).unwrap();
    assert_eq!(value, json!({ "type": "string" }));
}

#[test]
fn registry_describes_every_rule() {
    let mut registry = SchemaRegistry::new();
    registry.register("email", ValidationRule::string().format("email")).unwrap();
    registry.register("age", ValidationRule::integer()).unwrap();

    let descriptors = registry.describe();
    assert_eq!(descriptors.len(), 2);
    assert_eq!(descriptors["email"].field_type, FieldType::String);
    assert_eq!(descriptors["age"].field_type, FieldType::Number);
}

#[test]
fn identical_reregistration_is_accepted() {
    let mut registry = SchemaRegistry::new();
    registry.register("name", ValidationRule::string()).unwrap();
    registry.register("name", ValidationRule::string()).unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn conflicting_reregistration_is_rejected() {
    let mut registry = SchemaRegistry::new();
    registry.register("name", ValidationRule::string()).unwrap();
    let err = registry.register("name", ValidationRule::integer()).unwrap_err();
    assert!(matches!(err, NestoiError::ConflictingField(ref f) if f == "name"));
    assert_eq!(registry.get("name"), Some(&ValidationRule::string()));
}

#[test]
fn uncompilable_rule_is_rejected() {
    let mut registry = SchemaRegistry::new();
    let err = registry
        .register("broken", json!({ "type": "not-a-type" }))
        .unwrap_err();
    assert!(matches!(err, NestoiError::InvalidRule { ref field, .. } if field == "broken"));
    assert!(!registry.contains("broken"));
}
