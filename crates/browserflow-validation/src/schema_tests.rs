//! Tests for section schemas.

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;

fn person() -> SectionSchema {
    SectionSchema::new()
        .field("name", FieldRule::string().required())
        .field("age", FieldRule::number().default(30))
}

fn messages(violations: &[SchemaViolation]) -> Vec<&str> {
    violations.iter().map(|v| v.message.as_str()).collect()
}

#[test]
fn test_defaults_applied_and_unknown_stripped() {
    let out = person()
        .validate(&json!({ "name": "Alice", "extraField": "x" }))
        .unwrap();
    assert_eq!(Value::Object(out), json!({ "name": "Alice", "age": 30 }));
}

#[test]
fn test_all_violations_collected() {
    let violations = person().validate(&json!({ "age": "not_a_number" })).unwrap_err();
    assert_eq!(
        messages(&violations),
        vec!["\"name\" is required", "\"age\" must be a number"]
    );
    assert_eq!(violations[0].code, "any.required");
    assert_eq!(violations[1].path, vec![PathSegment::Key("age".into())]);
}

#[test]
fn test_string_input_coerced() {
    let schema = SectionSchema::new()
        .field("page", FieldRule::integer())
        .field("ratio", FieldRule::number())
        .field("full", FieldRule::boolean());
    let out = schema
        .validate(&json!({ "page": "42", "ratio": "0.5", "full": "TRUE" }))
        .unwrap();
    assert_eq!(Value::Object(out), json!({ "page": 42, "ratio": 0.5, "full": true }));
}

#[test]
fn test_integer_rejects_fraction() {
    let schema = SectionSchema::new().field("count", FieldRule::integer());
    let violations = schema.validate(&json!({ "count": 2.5 })).unwrap_err();
    assert_eq!(messages(&violations), vec!["\"count\" must be an integer"]);
}

#[test]
fn test_integer_normalises_whole_float() {
    let schema = SectionSchema::new().field("count", FieldRule::integer());
    let out = schema.validate(&json!({ "count": 3.0 })).unwrap();
    assert_eq!(out["count"], json!(3));
    assert!(out["count"].is_i64());
}

#[test]
fn test_unsafe_numbers_rejected() {
    let schema = SectionSchema::new()
        .field("page", FieldRule::integer())
        .field("ratio", FieldRule::number());
    let violations = schema
        .validate(&json!({ "page": "99999999999999999999", "ratio": -1e30 }))
        .unwrap_err();
    assert_eq!(
        messages(&violations),
        vec!["\"page\" must be a safe number", "\"ratio\" must be a safe number"]
    );
    assert!(violations.iter().all(|v| v.code == "number.unsafe"));

    let out = schema
        .validate(&json!({ "page": 9_007_199_254_740_991_i64, "ratio": 1.5 }))
        .unwrap();
    assert_eq!(out["page"], json!(9_007_199_254_740_991_i64));
}

#[test]
fn test_empty_string_rejected_unless_allowed() {
    let strict = SectionSchema::new().field("text", FieldRule::string());
    let violations = strict.validate(&json!({ "text": "" })).unwrap_err();
    assert_eq!(messages(&violations), vec!["\"text\" is not allowed to be empty"]);

    let lenient = SectionSchema::new().field("text", FieldRule::string().allow_empty());
    assert!(lenient.validate(&json!({ "text": "" })).is_ok());
}

#[test]
fn test_null_is_not_a_string() {
    let schema = SectionSchema::new()
        .field("text", FieldRule::string())
        .field("value", FieldRule::any());
    let violations = schema
        .validate(&json!({ "text": null, "value": null }))
        .unwrap_err();
    assert_eq!(messages(&violations), vec!["\"text\" must be a string"]);
}

#[test]
fn test_valid_set() {
    let schema = SectionSchema::new().field(
        "button",
        FieldRule::string().valid(["left", "right", "middle"]),
    );
    let violations = schema.validate(&json!({ "button": "side" })).unwrap_err();
    assert_eq!(
        messages(&violations),
        vec!["\"button\" must be one of [left, right, middle]"]
    );
    assert!(schema.validate(&json!({ "button": "right" })).is_ok());
}

#[test]
fn test_numeric_valid_set_accepts_coerced_string() {
    let schema = SectionSchema::new().field("level", FieldRule::integer().valid([1, 2, 3]));
    let out = schema.validate(&json!({ "level": "2" })).unwrap();
    assert_eq!(out["level"], json!(2));
}

#[test]
fn test_string_length_bounds() {
    let schema = SectionSchema::new().field("code", FieldRule::string().min(3).max(5));
    let short = schema.validate(&json!({ "code": "ab" })).unwrap_err();
    assert_eq!(
        messages(&short),
        vec!["\"code\" length must be at least 3 characters long"]
    );
    let long = schema.validate(&json!({ "code": "abcdef" })).unwrap_err();
    assert_eq!(
        messages(&long),
        vec!["\"code\" length must be less than or equal to 5 characters long"]
    );
}

#[test]
fn test_number_bounds() {
    let schema = SectionSchema::new().field("limit", FieldRule::integer().min(1).max(100));
    let violations = schema.validate(&json!({ "limit": 500 })).unwrap_err();
    assert_eq!(
        messages(&violations),
        vec!["\"limit\" must be less than or equal to 100"]
    );
    let violations = schema.validate(&json!({ "limit": "0" })).unwrap_err();
    assert_eq!(
        messages(&violations),
        vec!["\"limit\" must be greater than or equal to 1"]
    );
}

#[test]
fn test_pattern() {
    let schema = SectionSchema::new().field("url", FieldRule::string().pattern(r"^https?://"));
    let violations = schema.validate(&json!({ "url": "ftp://example.com" })).unwrap_err();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, "string.pattern.base");
    assert!(violations[0].message.contains("fails to match the required pattern"));
    assert!(schema.validate(&json!({ "url": "https://example.com" })).is_ok());
}

#[test]
fn test_nested_object_sanitized() {
    let viewport = SectionSchema::new()
        .field("width", FieldRule::integer().required())
        .field("height", FieldRule::integer().default(720));
    let schema = SectionSchema::new().field("viewport", FieldRule::object(viewport));

    let out = schema
        .validate(&json!({ "viewport": { "width": "1280", "depth": 3 } }))
        .unwrap();
    assert_eq!(
        Value::Object(out),
        json!({ "viewport": { "width": 1280, "height": 720 } })
    );
}

#[test]
fn test_nested_violation_labels_full_path() {
    let viewport = SectionSchema::new().field("width", FieldRule::integer().required());
    let schema = SectionSchema::new().field("viewport", FieldRule::object(viewport));
    let violations = schema.validate(&json!({ "viewport": {} })).unwrap_err();
    assert_eq!(messages(&violations), vec!["\"viewport.width\" is required"]);
    assert_eq!(violations[0].leaf_key(), Some("width"));
}

#[test]
fn test_array_items_checked_individually() {
    let schema = SectionSchema::new().field("tags", FieldRule::array(FieldRule::string()));
    let violations = schema.validate(&json!({ "tags": ["a", 2, "c", false] })).unwrap_err();
    assert_eq!(
        messages(&violations),
        vec!["\"tags[1]\" must be a string", "\"tags[3]\" must be a string"]
    );
    assert_eq!(
        violations[0].path,
        vec![PathSegment::Key("tags".into()), PathSegment::Index(1)]
    );
}

#[test]
fn test_array_length_bounds() {
    let schema = SectionSchema::new().field("steps", FieldRule::array(FieldRule::any()).min(1));
    let violations = schema.validate(&json!({ "steps": [] })).unwrap_err();
    assert_eq!(messages(&violations), vec!["\"steps\" must contain at least 1 items"]);
}

fn wait_schema() -> SectionSchema {
    SectionSchema::new()
        .field(
            "type",
            FieldRule::string().valid(["selector", "timeout"]).required(),
        )
        .field(
            "selector",
            FieldRule::string().when(
                Condition::new("type", "selector", FieldRule::string().required())
                    .otherwise(FieldRule::string().forbidden()),
            ),
        )
        .field(
            "duration",
            FieldRule::integer().when(Condition::new(
                "type",
                "timeout",
                FieldRule::integer().min(0).required(),
            )),
        )
}

#[test]
fn test_condition_makes_sibling_required() {
    let violations = wait_schema().validate(&json!({ "type": "selector" })).unwrap_err();
    assert_eq!(messages(&violations), vec!["\"selector\" is required"]);

    let violations = wait_schema().validate(&json!({ "type": "timeout" })).unwrap_err();
    assert_eq!(messages(&violations), vec!["\"duration\" is required"]);
}

#[test]
fn test_condition_otherwise_forbids_field() {
    let violations = wait_schema()
        .validate(&json!({ "type": "timeout", "duration": 500, "selector": "#main" }))
        .unwrap_err();
    assert_eq!(messages(&violations), vec!["\"selector\" is not allowed"]);
}

#[test]
fn test_condition_satisfied() {
    let out = wait_schema()
        .validate(&json!({ "type": "selector", "selector": "#main" }))
        .unwrap();
    assert_eq!(Value::Object(out), json!({ "type": "selector", "selector": "#main" }));
}

#[test]
fn test_condition_uses_sibling_default() {
    let schema = SectionSchema::new()
        .field("format", FieldRule::string().valid(["png", "jpeg"]).default("png"))
        .field(
            "quality",
            FieldRule::integer().when(
                Condition::new("format", "jpeg", FieldRule::integer().min(0).max(100))
                    .otherwise(FieldRule::integer().forbidden()),
            ),
        );
    let violations = schema.validate(&json!({ "quality": 80 })).unwrap_err();
    assert_eq!(messages(&violations), vec!["\"quality\" is not allowed"]);

    let out = schema.validate(&json!({ "format": "jpeg", "quality": "80" })).unwrap();
    assert_eq!(out["quality"], json!(80));
}

#[test]
fn test_forbidden_field_gets_no_default() {
    let schema = SectionSchema::new().field("x", FieldRule::integer().default(1).forbidden());
    let out = schema.validate(&json!({})).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_sanitization_is_idempotent() {
    let schema = wait_schema().field("retries", FieldRule::integer().default(3));
    let once = schema
        .validate(&json!({ "type": "timeout", "duration": "250", "junk": true }))
        .unwrap();
    let twice = schema.validate(&Value::Object(once.clone())).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_root_must_be_object() {
    let violations = person().validate(&json!(["not", "an", "object"])).unwrap_err();
    assert_eq!(messages(&violations), vec!["\"value\" must be of type object"]);
    assert!(violations[0].path.is_empty());
}

#[test]
fn test_field_redeclaration_replaces_rule() {
    let schema = SectionSchema::new()
        .field("id", FieldRule::string())
        .field("id", FieldRule::integer());
    assert_eq!(schema.len(), 1);
    assert!(matches!(schema.get("id").unwrap().kind(), FieldKind::Integer));
}

#[test]
fn test_json_schema_rendering() {
    let rendered = SectionSchema::new()
        .field(
            "url",
            FieldRule::string()
                .required()
                .pattern("^https?://")
                .describe("Page to open"),
        )
        .field("timeout", FieldRule::integer().min(0).default(30000))
        .to_json_schema();

    assert_eq!(rendered["type"], "object");
    assert_eq!(rendered["additionalProperties"], false);
    assert_eq!(rendered["required"], json!(["url"]));
    assert_eq!(rendered["properties"]["url"]["pattern"], "^https?://");
    assert_eq!(rendered["properties"]["url"]["description"], "Page to open");
    assert_eq!(rendered["properties"]["timeout"]["minimum"], 0);
    assert_eq!(rendered["properties"]["timeout"]["default"], 30000);
}

#[test]
fn test_json_schema_renders_conditions() {
    let rendered = wait_schema().to_json_schema();
    let all_of = rendered["allOf"].as_array().unwrap();
    assert_eq!(all_of.len(), 2);
    assert_eq!(all_of[0]["if"]["properties"]["type"]["const"], "selector");
    assert_eq!(all_of[0]["then"]["required"], json!(["selector"]));
    assert_eq!(all_of[0]["else"]["not"]["required"], json!(["selector"]));
}
