//! Converts declared tool parameters into JSON Schema and validates inputs.

use std::fmt;
use std::sync::Arc;

use jsonschema::JSONSchema;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use crate::domain::tool::Parameter;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid JSON schema: {0}")]
    Compile(String),
    #[error("input does not match schema: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl SchemaError {
    pub fn user_message(&self) -> String {
        match self {
            SchemaError::Compile(_) => "The tool's input schema is invalid.".to_string(),
            SchemaError::Validation(violations) => {
                format!("Invalid tool arguments: {}", violations.join("; "))
            }
        }
    }
}

/// Maps a loose parameter type string to a JSON Schema fragment.
///
/// Array suffixes are resolved first, then `|` unions of literals, then the
/// primitive names. Anything else falls back to `string`.
pub fn type_to_schema(type_str: &str) -> Value {
    let trimmed = type_str.trim();

    if let Some(base) = trimmed.strip_suffix("[]") {
        return json!({ "type": "array", "items": type_to_schema(base) });
    }

    if trimmed.contains('|') {
        let values: Vec<Value> = trimmed
            .split('|')
            .map(|alt| strip_quotes(alt.trim()))
            .filter(|alt| !alt.is_empty())
            .map(|alt| Value::String(alt.to_string()))
            .collect();
        return json!({ "type": "string", "enum": values });
    }

    match trimmed {
        "string" | "number" | "boolean" | "object" => json!({ "type": trimmed }),
        other => {
            debug!(type_name = other, "Unknown parameter type, treating as string");
            json!({ "type": "string" })
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Builds an object schema from an ordered parameter list.
///
/// Declared defaults are documentation only and are not copied into the
/// schema.
pub fn params_to_schema(parameters: &[Parameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for parameter in parameters {
        let mut schema = type_to_schema(&parameter.type_name);
        if let Value::Object(fields) = &mut schema {
            fields.insert(
                "description".to_string(),
                Value::String(parameter.description.clone()),
            );
        }
        properties.insert(parameter.name.clone(), schema);
        if parameter.required {
            required.push(Value::String(parameter.name.clone()));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// A compiled JSON Schema validator.
#[derive(Clone)]
pub struct InputSchema {
    schema: Value,
    compiled: Arc<JSONSchema>,
}

impl InputSchema {
    pub fn compile(schema: Value) -> Result<Self, SchemaError> {
        let compiled =
            JSONSchema::compile(&schema).map_err(|err| SchemaError::Compile(err.to_string()))?;
        Ok(Self {
            schema,
            compiled: Arc::new(compiled),
        })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.compiled.is_valid(instance)
    }

    /// Validates `instance`, collecting every violation as `path: message`.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaError> {
        match self.compiled.validate(instance) {
            Ok(()) => Ok(()),
            Err(errors) => {
                let violations = errors
                    .map(|err| {
                        let path = err.instance_path.to_string();
                        if path.is_empty() {
                            err.to_string()
                        } else {
                            format!("{path}: {err}")
                        }
                    })
                    .collect();
                Err(SchemaError::Validation(violations))
            }
        }
    }
}

impl fmt::Debug for InputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSchema")
            .field("schema", &self.schema)
            .finish()
    }
}
