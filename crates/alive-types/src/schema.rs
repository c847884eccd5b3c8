//! JSON schema helpers shared by field, parameter and return declarations.

use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde_json::Value;

/// Generate an inlined JSON schema for `T`.
///
/// Subschemas are inlined so the result can be embedded inside another
/// schema (a tool's parameter object) without dangling `$ref`s. The
/// top-level `$schema` marker is stripped for the same reason.
pub fn schema_value<T: JsonSchema + ?Sized>() -> Value {
    let generator = SchemaSettings::draft2020_12()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator();
    let mut value = Value::from(generator.into_root_schema_for::<T>());
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
    }
    value
}

/// Short type name for `T`, as reported by its schema.
pub fn type_name<T: JsonSchema + ?Sized>() -> String {
    T::schema_name().into_owned()
}

/// The JSON kind of a runtime value (`"null"`, `"boolean"`, `"integer"`,
/// `"number"`, `"string"`, `"array"` or `"object"`).
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The `type` keyword(s) declared at the top of a schema.
///
/// Returns an empty list for schemas that do not constrain the type
/// (`true`, `{}`, `anyOf` without a top-level `type`).
pub fn declared_kinds(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(kind)) => vec![kind.as_str()],
        Some(Value::Array(kinds)) => kinds.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Whether a runtime value's kind is admitted by the schema's `type` keyword.
///
/// Integers satisfy `number`. Unconstrained schemas admit everything.
pub fn kind_matches(schema: &Value, value: &Value) -> bool {
    let declared = declared_kinds(schema);
    if declared.is_empty() {
        return true;
    }
    let actual = value_kind(value);
    declared
        .iter()
        .any(|kind| *kind == actual || (*kind == "number" && actual == "integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_value_strips_meta_schema() {
        let schema = schema_value::<u32>();
        assert!(schema.get("$schema").is_none());
        assert_eq!(schema["type"], "integer");
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(value_kind(&json!(null)), "null");
        assert_eq!(value_kind(&json!(3)), "integer");
        assert_eq!(value_kind(&json!(3.5)), "number");
        assert_eq!(value_kind(&json!("x")), "string");
        assert_eq!(value_kind(&json!([1])), "array");
        assert_eq!(value_kind(&json!({"a": 1})), "object");
    }

    #[test]
    fn test_kind_matches_accepts_integer_for_number() {
        let schema = json!({"type": "number"});
        assert!(kind_matches(&schema, &json!(4)));
        assert!(!kind_matches(&schema, &json!("4")));
    }

    #[test]
    fn test_kind_matches_nullable_and_unconstrained() {
        let nullable = json!({"type": ["string", "null"]});
        assert!(kind_matches(&nullable, &json!(null)));
        assert!(kind_matches(&nullable, &json!("a")));
        assert!(!kind_matches(&nullable, &json!(1)));
        assert!(kind_matches(&json!({}), &json!([1, 2])));
    }
}
