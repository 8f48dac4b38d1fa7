use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::tool::{HealthStatus, Package, Parameter, Tool};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExecuteToolRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Payload of the `chunk` event.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChunkEvent {
    pub text: String,
}

/// Payload of the `complete` event.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteEvent {
    pub execution_time_ms: u64,
    pub agent_steps: u32,
}

/// Payload of the `error` event.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEvent {
    pub message: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<usize>,
    /// Items per page (1-100, default 20)
    pub limit: Option<usize>,
}

/// A tool as listed by `GET /api/tools`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    pub id: String,
    pub package_name: String,
    pub version: String,
    pub export_name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    pub health: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

impl ToolSummary {
    pub fn new(package: &Package, tool: &Tool) -> Self {
        Self {
            id: tool.id.clone(),
            package_name: package.name.clone(),
            version: package.version.clone(),
            export_name: tool.export_name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
            health: tool.health.status,
            quality_score: tool.quality_score,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
