//! Binds a catalog tool to a validated schema and an executor.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::schema::{InputSchema, SchemaError, params_to_schema};
use crate::config::ExecutorConfig;
use crate::domain::tool::{Package, Parameter, Returns, Tool};
use crate::infrastructure::executor::{ExecuteRequest, PackageExecutor};
pub use crate::infrastructure::model::ToolSpec;

const MAX_TOOL_NAME_LEN: usize = 64;
const DEFAULT_FAILURE: &str = "Tool execution failed";

#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error(transparent)]
    InvalidArguments(#[from] SchemaError),
    #[error("{message}")]
    Failed { message: String },
}

impl ToolCallError {
    pub fn user_message(&self) -> String {
        match self {
            ToolCallError::InvalidArguments(err) => err.user_message(),
            ToolCallError::Failed { message } => message.clone(),
        }
    }
}

/// Per-execution settings forwarded to the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    pub timeout_ms: u64,
    pub env: HashMap<String, String>,
}

impl From<&ExecutorConfig> for ExecutionOptions {
    fn from(config: &ExecutorConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            env: config.env.clone(),
        }
    }
}

/// A tool ready to be offered to a model and executed.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    package_name: String,
    export_name: String,
    parameters: Vec<Parameter>,
    returns: Option<Returns>,
    schema: InputSchema,
    executor: Arc<dyn PackageExecutor>,
    options: ExecutionOptions,
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("package_name", &self.package_name)
            .field("export_name", &self.export_name)
            .finish_non_exhaustive()
    }
}

/// Builds a definition for `tool` of `package`.
///
/// The tool's own `input_schema` is used when present; otherwise the schema
/// is derived from its parameters.
pub fn create_tool_definition(
    package: &Package,
    tool: &Tool,
    executor: Arc<dyn PackageExecutor>,
    options: ExecutionOptions,
) -> Result<ToolDefinition, SchemaError> {
    let schema_value = match &tool.input_schema {
        Some(schema) => schema.clone(),
        None => params_to_schema(&tool.parameters),
    };
    let schema = InputSchema::compile(schema_value)?;
    let name = tool_key(&package.name, &tool.export_name);
    debug!(
        tool = name.as_str(),
        package = package.name.as_str(),
        export = tool.export_name.as_str(),
        "Built tool definition"
    );

    Ok(ToolDefinition {
        name,
        description: tool.description.clone(),
        package_name: package.name.clone(),
        export_name: tool.export_name.clone(),
        parameters: tool.parameters.clone(),
        returns: tool.returns.clone(),
        schema,
        executor,
        options,
    })
}

impl ToolDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn export_name(&self) -> &str {
        &self.export_name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn returns(&self) -> Option<&Returns> {
        self.returns.as_ref()
    }

    pub fn schema(&self) -> &Value {
        self.schema.schema()
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.schema.schema().clone(),
        }
    }

    /// Validates `params` and runs the tool through the executor.
    pub async fn execute(&self, params: Value) -> Result<Value, ToolCallError> {
        self.schema.validate(&params)?;

        info!(
            package = self.package_name.as_str(),
            export = self.export_name.as_str(),
            "Executing tool"
        );
        let result = self
            .executor
            .execute(ExecuteRequest {
                package_name: self.package_name.clone(),
                export_name: self.export_name.clone(),
                params,
                timeout_ms: self.options.timeout_ms,
                env: self.options.env.clone(),
            })
            .await;

        if !result.success {
            return Err(ToolCallError::Failed {
                message: result.error.unwrap_or_else(|| DEFAULT_FAILURE.to_string()),
            });
        }
        Ok(result.output.unwrap_or(Value::Null))
    }
}

/// Makes a provider-safe function name: `[a-zA-Z0-9_-]`, no leading `-`/`_`,
/// at most 64 chars, never empty.
pub fn sanitize_tool_name(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .filter(|c| *c != '@')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed: String = replaced
        .trim_start_matches(['-', '_'])
        .chars()
        .take(MAX_TOOL_NAME_LEN)
        .collect();
    if trimmed.is_empty() {
        "tool".to_string()
    } else {
        trimmed
    }
}

/// Function name for an export; `default` exports use the package name alone.
pub fn tool_key(package: &str, export: &str) -> String {
    if export == "default" {
        sanitize_tool_name(package)
    } else {
        sanitize_tool_name(&format!("{package}_{export}"))
    }
}
