use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{ExecuteRequest, PackageExecutor, elapsed_ms};
use crate::domain::tool::ExecutionResult;

/// Extra time granted to the HTTP call on top of the sandbox timeout.
const TRANSPORT_GRACE_MS: u64 = 5_000;

/// Forwards executions to a sandbox service at `POST {endpoint}/execute-tool`.
#[derive(Debug, Clone)]
pub struct HttpPackageExecutor {
    endpoint: String,
    http: Client,
}

impl HttpPackageExecutor {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/execute-tool", self.endpoint)
    }
}

#[async_trait]
impl PackageExecutor for HttpPackageExecutor {
    async fn execute(&self, request: ExecuteRequest) -> ExecutionResult {
        let started = Instant::now();
        let url = self.url();
        debug!(
            url = url.as_str(),
            package = request.package_name.as_str(),
            export = request.export_name.as_str(),
            "Sending execution to sandbox"
        );

        let response = self
            .http
            .post(&url)
            .timeout(Duration::from_millis(
                request.timeout_ms.saturating_add(TRANSPORT_GRACE_MS),
            ))
            .json(&request)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Sandbox request failed");
                let message = if err.is_timeout() {
                    format!("Sandbox did not respond within {}ms", request.timeout_ms)
                } else if err.is_connect() {
                    format!("Could not connect to sandbox at {}", self.endpoint)
                } else {
                    format!("Sandbox request failed: {err}")
                };
                return ExecutionResult::failed(message, elapsed_ms(started));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Sandbox returned an error status");
            return ExecutionResult::failed(
                format!("Sandbox returned {status}: {}", body.trim()),
                elapsed_ms(started),
            );
        }

        match response.json::<ExecutionResult>().await {
            Ok(mut result) => {
                if !result.success && result.error.is_none() {
                    result.error = Some("Tool execution failed".to_string());
                }
                result
            }
            Err(err) => {
                warn!(error = %err, "Sandbox returned an unreadable body");
                ExecutionResult::failed(
                    format!("Sandbox returned an invalid response: {err}"),
                    elapsed_ms(started),
                )
            }
        }
    }
}
