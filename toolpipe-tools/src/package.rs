use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// Declared parameter of a tool, as published in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn required(name: &str, type_name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, type_name: &str, description: &str, default: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            description: description.to_string(),
            required: false,
            default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnsSpec {
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
}

impl ReturnsSpec {
    pub fn new(type_name: &str, description: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            description: description.to_string(),
        }
    }
}

/// A runnable tool package with one export.
#[async_trait]
pub trait ToolPackage: Send + Sync {
    /// npm-style package name, e.g. `@toolpipe/text-chunk`.
    fn name(&self) -> &'static str;

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn export_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn parameters(&self) -> Vec<ParameterSpec>;

    fn returns(&self) -> Option<ReturnsSpec> {
        None
    }

    /// Full JSON Schema for inputs that the flat parameter list cannot express.
    fn input_schema(&self) -> Option<Value> {
        None
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError>;
}

/// Deserializes a tool input, turning serde failures into validation errors.
pub fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|err| ToolError::invalid(err.to_string()))
}

/// Serializes a tool output into JSON.
pub fn to_output<T: Serialize>(output: &T) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(output)?)
}
