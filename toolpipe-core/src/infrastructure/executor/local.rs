use std::time::{Duration, Instant};

use async_trait::async_trait;
use toolpipe_tools::ToolRegistry;
use tracing::{debug, warn};

use super::{ExecuteRequest, PackageExecutor, elapsed_ms};
use crate::domain::tool::ExecutionResult;

/// Runs built-in packages in-process with a timeout.
#[derive(Debug, Clone)]
pub struct LocalPackageExecutor {
    registry: ToolRegistry,
}

impl LocalPackageExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

#[async_trait]
impl PackageExecutor for LocalPackageExecutor {
    async fn execute(&self, request: ExecuteRequest) -> ExecutionResult {
        let started = Instant::now();
        let Some(package) = self.registry.get(&request.package_name) else {
            warn!(package = request.package_name.as_str(), "Package is not installed locally");
            return ExecutionResult::failed(
                format!("Package '{}' is not available", request.package_name),
                elapsed_ms(started),
            );
        };
        if package.export_name() != request.export_name && request.export_name != "default" {
            return ExecutionResult::failed(
                format!(
                    "Package '{}' has no export '{}'",
                    request.package_name, request.export_name
                ),
                elapsed_ms(started),
            );
        }
        if !request.env.is_empty() {
            debug!(
                vars = request.env.len(),
                "Ignoring execution env for in-process package"
            );
        }

        let timeout = Duration::from_millis(request.timeout_ms);
        let result = tokio::time::timeout(timeout, package.execute(request.params)).await;
        let elapsed = elapsed_ms(started);
        match result {
            Ok(Ok(output)) => {
                debug!(
                    package = request.package_name.as_str(),
                    export = request.export_name.as_str(),
                    elapsed_ms = elapsed,
                    "Package executed"
                );
                ExecutionResult::ok(output, elapsed)
            }
            Ok(Err(err)) => {
                warn!(
                    package = request.package_name.as_str(),
                    error = %err,
                    "Package execution failed"
                );
                ExecutionResult::failed(err.to_string(), elapsed)
            }
            Err(_) => {
                warn!(
                    package = request.package_name.as_str(),
                    timeout_ms = request.timeout_ms,
                    "Package execution timed out"
                );
                ExecutionResult::failed(
                    format!("Execution timed out after {}ms", request.timeout_ms),
                    elapsed,
                )
            }
        }
    }
}
