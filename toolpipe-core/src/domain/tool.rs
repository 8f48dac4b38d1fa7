//! Tool, package and execution records shared across the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolpipe_tools::{ParameterSpec, ReturnsSpec};
use utoipa::ToSchema;

/// A declared tool parameter.
///
/// `type` is a loose type string: `string`, `number`, `boolean`, `object`,
/// `T[]`, or a `'a'|'b'` union of literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub default: Option<Value>,
}

impl Parameter {
    pub fn new(name: &str, type_name: &str, description: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            description: description.to_string(),
            required,
            default: None,
        }
    }
}

impl From<ParameterSpec> for Parameter {
    fn from(spec: ParameterSpec) -> Self {
        Self {
            name: spec.name,
            type_name: spec.type_name,
            description: spec.description,
            required: spec.required,
            default: spec.default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Returns {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
}

impl From<ReturnsSpec> for Returns {
    fn from(spec: ReturnsSpec) -> Self {
        Self {
            type_name: spec.type_name,
            description: spec.description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Broken,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolHealth {
    #[serde(default)]
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub checked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: String,
    pub export_name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<Returns>,
    /// Full JSON Schema; takes precedence over `parameters` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub input_schema: Option<Value>,
    #[serde(default)]
    pub health: ToolHealth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NpmMetadata {
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub stars: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub npm: NpmMetadata,
    pub tools: Vec<Tool>,
}

/// Outcome of one package execution, as reported by an executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
}

impl ExecutionResult {
    pub fn ok(output: Value, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
            execution_time_ms,
        }
    }

    pub fn failed(error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            execution_time_ms,
        }
    }
}

/// Estimated token usage and cost of one run.
///
/// `total_tokens` always equals the sum of the four components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenBreakdown {
    pub input_tokens: u64,
    pub tool_desc_tokens: u64,
    pub schema_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost: f64,
}
