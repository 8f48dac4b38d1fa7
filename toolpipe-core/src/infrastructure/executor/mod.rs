//! Package executors run one export of a tool package.
//!
//! Executors never return transport errors: every failure is reported as an
//! [`ExecutionResult`] with `success == false` and a descriptive message.

mod local;
mod remote;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolpipe_tools::ToolRegistry;

use crate::config::{ConfigError, ExecutorConfig, ExecutorKind};
use crate::domain::tool::ExecutionResult;

pub use local::LocalPackageExecutor;
pub use remote::HttpPackageExecutor;

/// Body of an execution request, also the remote wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub package_name: String,
    pub export_name: String,
    pub params: Value,
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

#[async_trait]
pub trait PackageExecutor: Send + Sync {
    async fn execute(&self, request: ExecuteRequest) -> ExecutionResult;
}

/// Builds the executor selected by `[executor]`.
pub fn from_config(
    config: &ExecutorConfig,
    registry: ToolRegistry,
) -> Result<Arc<dyn PackageExecutor>, ConfigError> {
    match (config.kind, config.endpoint.as_deref()) {
        (ExecutorKind::Local, _) => Ok(Arc::new(LocalPackageExecutor::new(registry))),
        (ExecutorKind::Remote, Some(endpoint)) => Ok(Arc::new(HttpPackageExecutor::new(endpoint))),
        (ExecutorKind::Remote, None) => Err(ConfigError::MissingExecutorEndpoint),
    }
}

fn elapsed_ms(started: std::time::Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn local_kind_runs_builtin_packages() {
        let executor = from_config(&ExecutorConfig::default(), ToolRegistry::builtin()).unwrap();
        let result = executor
            .execute(ExecuteRequest {
                package_name: "@toolpipe/text-chunk".into(),
                export_name: "textChunk".into(),
                params: json!({"text": "One. Two."}),
                timeout_ms: 1_000,
                env: HashMap::new(),
            })
            .await;
        assert!(result.success, "{:?}", result.error);
    }

    #[test]
    fn remote_kind_without_endpoint_is_a_config_error() {
        let config = ExecutorConfig {
            kind: ExecutorKind::Remote,
            ..ExecutorConfig::default()
        };
        assert!(matches!(
            from_config(&config, ToolRegistry::builtin()),
            Err(ConfigError::MissingExecutorEndpoint)
        ));

        let config = ExecutorConfig {
            kind: ExecutorKind::Remote,
            endpoint: Some("http://127.0.0.1:9".into()),
            ..ExecutorConfig::default()
        };
        assert!(from_config(&config, ToolRegistry::builtin()).is_ok());
    }
}
