//! Structural checks over tool input schemas.
//!
//! Schemas are the JSON-Schema objects produced by `schemars` (or written by
//! hand). Only the structural subset tools actually use is interpreted:
//! `type`, `properties`, `required`, `additionalProperties`, `items`, `enum`,
//! `minimum` and `maximum`. Anything else (`$ref`, `anyOf`, formats) is
//! accepted as-is.

use rmcp::model::JsonObject;
use serde_json::Value;

use super::error::ValidationError;

/// Path used for errors concerning the argument object itself.
pub(crate) const ROOT_PATH: &str = "$";

/// Check that a schema is a well-formed object schema.
///
/// Returns a human-readable reason on failure.
pub fn check_well_formed(schema: &JsonObject) -> Result<(), String> {
    match schema.get("type") {
        Some(Value::String(t)) if t == "object" => {}
        Some(other) => return Err(format!("root type must be \"object\", found {other}")),
        None => return Err("root schema has no \"type\"".to_string()),
    }

    let properties = match schema.get("properties") {
        None => None,
        Some(Value::Object(props)) => Some(props),
        Some(_) => return Err("\"properties\" must be an object".to_string()),
    };

    if let Some(props) = properties {
        for (name, property) in props {
            if !property.is_object() && !property.is_boolean() {
                return Err(format!("property '{name}' must be a schema object"));
            }
        }
    }

    if let Some(required) = schema.get("required") {
        let Value::Array(required) = required else {
            return Err("\"required\" must be an array".to_string());
        };
        for entry in required {
            let Value::String(name) = entry else {
                return Err("\"required\" entries must be strings".to_string());
            };
            if !properties.is_some_and(|p| p.contains_key(name)) {
                return Err(format!("required field '{name}' is not declared"));
            }
        }
    }

    match schema.get("additionalProperties") {
        None | Some(Value::Bool(_)) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err("\"additionalProperties\" must be a boolean or a schema".to_string()),
    }
}

/// Validate tool arguments against an object schema.
///
/// Reports the first offending field. Required fields are checked before
/// the values of present fields.
pub fn validate_arguments(schema: &JsonObject, arguments: &JsonObject) -> Result<(), ValidationError> {
    validate_object(schema, arguments, "")
}

fn validate_object(schema: &JsonObject, object: &JsonObject, prefix: &str) -> Result<(), ValidationError> {
    let properties = schema.get("properties").and_then(Value::as_object);

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if object.get(name).is_none_or(Value::is_null) {
                return Err(ValidationError::new(
                    join(prefix, name),
                    "required field is missing",
                ));
            }
        }
    }

    let closed = matches!(schema.get("additionalProperties"), Some(Value::Bool(false)));

    for (name, value) in object {
        let path = join(prefix, name);
        match properties.and_then(|p| p.get(name)) {
            Some(Value::Object(property)) => validate_value(property, value, &path)?,
            Some(_) => {}
            None if closed => {
                return Err(ValidationError::new(path, "unknown field"));
            }
            None => {}
        }
    }

    Ok(())
}

fn validate_value(schema: &JsonObject, value: &Value, path: &str) -> Result<(), ValidationError> {
    // OpenAPI-style `nullable`, as produced for `Option<T>` fields.
    if value.is_null() && matches!(schema.get("nullable"), Some(Value::Bool(true))) {
        return Ok(());
    }

    if let Some(expected) = schema.get("type") {
        let accepted: Vec<&str> = match expected {
            Value::String(t) => vec![t.as_str()],
            Value::Array(types) => types.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if !accepted.is_empty() && !accepted.iter().any(|t| matches_type(t, value)) {
            return Err(ValidationError::new(
                path,
                format!("expected {}, found {}", accepted.join(" or "), type_name(value)),
            ));
        }
    }

    if let Some(Value::Array(allowed)) = schema.get("enum") {
        if !allowed.contains(value) {
            return Err(ValidationError::new(path, "value is not one of the allowed values"));
        }
    }

    if let Some(number) = value.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
            if number < min {
                return Err(ValidationError::new(path, format!("must be >= {min}")));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
            if number > max {
                return Err(ValidationError::new(path, format!("must be <= {max}")));
            }
        }
    }

    match value {
        Value::Object(object) if schema.contains_key("properties") => {
            validate_object(schema, object, path)
        }
        Value::Array(items) => match schema.get("items") {
            Some(Value::Object(item_schema)) => {
                for (index, item) in items.iter().enumerate() {
                    validate_value(item_schema, item, &format!("{path}[{index}]"))?;
                }
                Ok(())
            }
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        // Unknown type keywords are not ours to enforce.
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
