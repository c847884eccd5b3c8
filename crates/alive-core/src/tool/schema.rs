//! Parameter schemas and argument binding for tools.
//!
//! A tool's parameter schema is a JSON object schema built from its
//! declared [`ParamSpec`]s. Arguments proposed by a model are bound back
//! against the same declarations before the method body runs.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use alive_types::agent::ParamSpec;
use alive_types::error::ToolExecutionError;
use alive_types::schema::{kind_matches, value_kind};

/// Build the `type: object` schema describing a method's parameters.
///
/// Parameters with a default are optional; the rest are listed under
/// `required`. Unknown keys are not allowed.
pub fn parameter_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut schema = param.schema.clone();
        if let Some(object) = schema.as_object_mut() {
            if !param.description.is_empty() {
                object.insert("description".into(), json!(param.description));
            }
            if let Some(default) = &param.default {
                object.insert("default".into(), default.clone());
            }
        }
        properties.insert(param.name.clone(), schema);
        if param.is_required() {
            required.push(json!(param.name));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Bind model-proposed arguments to a method's parameters.
///
/// `null` is treated as an empty argument object. Missing optional
/// parameters take their default; missing required parameters, unknown
/// keys and values of the wrong JSON kind are rejected.
pub fn bind_arguments(
    tool: &str,
    params: &[ParamSpec],
    arguments: &Value,
) -> Result<ToolArgs, ToolExecutionError> {
    let invalid = |message: String| ToolExecutionError::InvalidArguments {
        tool: tool.to_string(),
        message,
    };

    let empty = Map::new();
    let provided = match arguments {
        Value::Null => &empty,
        Value::Object(map) => map,
        other => {
            return Err(invalid(format!(
                "expected an object, got {}",
                value_kind(other)
            )));
        }
    };

    if let Some(unknown) = provided
        .keys()
        .find(|key| !params.iter().any(|p| &p.name == *key))
    {
        return Err(invalid(format!("unexpected argument '{unknown}'")));
    }

    let mut values = Map::new();
    for param in params {
        let value = match (provided.get(&param.name), &param.default) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(invalid(format!("missing argument '{}'", param.name)));
            }
        };
        if !kind_matches(&param.schema, &value) {
            return Err(invalid(format!(
                "argument '{}' expects {}, got {}",
                param.name,
                param.type_name,
                value_kind(&value)
            )));
        }
        values.insert(param.name.clone(), value);
    }

    Ok(ToolArgs {
        tool: tool.to_string(),
        values,
    })
}

/// Arguments bound to a method's parameters, defaults filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    tool: String,
    values: Map<String, Value>,
}

impl ToolArgs {
    /// Deserialize one argument.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ToolExecutionError> {
        let value = self.values.get(name).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| ToolExecutionError::InvalidArguments {
            tool: self.tool.clone(),
            message: format!("argument '{name}': {e}"),
        })
    }

    /// Deserialize all arguments into one struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolExecutionError> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
            ToolExecutionError::InvalidArguments {
                tool: self.tool.clone(),
                message: e.to_string(),
            }
        })
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<ParamSpec> {
        vec![
            ParamSpec::required::<String>("topic").describe("what to write about"),
            ParamSpec::optional::<u32>("limit", json!(10)),
        ]
    }

    #[test]
    fn test_parameter_schema_shape() {
        let schema = parameter_schema(&params());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["topic"]));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["properties"]["topic"]["type"], "string");
        assert_eq!(
            schema["properties"]["topic"]["description"],
            "what to write about"
        );
        assert_eq!(schema["properties"]["limit"]["default"], 10);
    }

    #[test]
    fn test_empty_parameter_list() {
        let schema = parameter_schema(&[]);
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn test_bind_fills_defaults() {
        let args = bind_arguments("write", &params(), &json!({"topic": "rust"})).unwrap();
        assert_eq!(args.get::<String>("topic").unwrap(), "rust");
        assert_eq!(args.get::<u32>("limit").unwrap(), 10);
    }

    #[test]
    fn test_bind_null_as_empty_object() {
        let only_optional = vec![ParamSpec::optional::<u32>("limit", json!(3))];
        let args = bind_arguments("t", &only_optional, &Value::Null).unwrap();
        assert_eq!(args.raw("limit"), Some(&json!(3)));
    }

    #[test]
    fn test_bind_rejects_bad_arguments() {
        let missing = bind_arguments("write", &params(), &json!({})).unwrap_err();
        assert!(missing.to_string().contains("missing argument 'topic'"));

        let extra = bind_arguments("write", &params(), &json!({"topic": "x", "mood": 1}));
        assert!(extra.unwrap_err().to_string().contains("unexpected argument"));

        let wrong_kind = bind_arguments("write", &params(), &json!({"topic": 5}));
        assert!(matches!(
            wrong_kind,
            Err(ToolExecutionError::InvalidArguments { .. })
        ));

        let not_object = bind_arguments("write", &params(), &json!([1]));
        assert!(not_object.is_err());
    }

    #[test]
    fn test_parse_into_struct() {
        #[derive(serde::Deserialize)]
        struct Write {
            topic: String,
            limit: u32,
        }
        let args = bind_arguments("write", &params(), &json!({"topic": "a", "limit": 2})).unwrap();
        let parsed: Write = args.parse().unwrap();
        assert_eq!(parsed.topic, "a");
        assert_eq!(parsed.limit, 2);
    }
}
