// Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use futures::stream;
use serde_json::Value;
use toolpipe_core::agent::{AgentRunner, AgentSettings};
use toolpipe_core::catalog::Catalog;
use toolpipe_core::config::{Pricing, RateLimitConfig};
use toolpipe_core::definition::{ExecutionOptions, ToolDefinition, create_tool_definition};
use toolpipe_core::executor::{LocalPackageExecutor, PackageExecutor};
use toolpipe_core::model::{
    ModelError, ModelProvider, ModelRequest, ModelResponse, ModelStream, ModelStreamEvent,
};
use toolpipe_core::server::{ServerState, build_router};
use toolpipe_core::types::ToolCall;
use toolpipe_tools::ToolRegistry;

pub const TEXT_CHUNK: &str = "@toolpipe/text-chunk";

/// Model double that replays a fixed script of replies.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ModelResponse>>,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<ModelResponse>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::invalid_response("scripted", "script exhausted"))
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.next(request)
    }

    async fn chat_stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        let response = self.next(request)?;
        let mut events: Vec<Result<ModelStreamEvent, ModelError>> = response
            .content()
            .split_inclusive(' ')
            .map(|word| Ok(ModelStreamEvent::Delta(word.to_string())))
            .collect();
        events.push(Ok(ModelStreamEvent::Finished(response)));
        Ok(Box::pin(stream::iter(events)))
    }
}

pub fn tool_call(name: &str, arguments: Value) -> ModelResponse {
    ModelResponse::with_tool_calls(
        "",
        vec![ToolCall {
            id: "call_1".into(),
            name: name.to_string(),
            arguments,
        }],
    )
}

pub fn settings(max_steps: u32) -> AgentSettings {
    AgentSettings {
        provider_id: "scripted".into(),
        model: "test-model".into(),
        system_prompt: None,
        max_steps,
        pricing: Pricing::default(),
    }
}

pub fn builtin_catalog() -> (ToolRegistry, Catalog) {
    let registry = ToolRegistry::builtin();
    let catalog = Catalog::from_registry(&registry).expect("builtin catalog");
    (registry, catalog)
}

pub fn local_executor(registry: &ToolRegistry) -> Arc<dyn PackageExecutor> {
    Arc::new(LocalPackageExecutor::new(registry.clone()))
}

pub fn options() -> ExecutionOptions {
    ExecutionOptions {
        timeout_ms: 5_000,
        ..ExecutionOptions::default()
    }
}

pub fn definition_for(package: &str) -> ToolDefinition {
    let (registry, catalog) = builtin_catalog();
    let (package, tool) = catalog.find(package, None).expect("package in catalog");
    create_tool_definition(package, tool, local_executor(&registry), options())
        .expect("definition builds")
}

/// Serves the REST router for `provider` on an ephemeral port.
pub async fn spawn_server(provider: Arc<ScriptedProvider>, rate_limit: RateLimitConfig) -> String {
    let (registry, catalog) = builtin_catalog();
    let state = ServerState::new(
        AgentRunner::new(provider, settings(5)),
        catalog,
        local_executor(&registry),
        options(),
        rate_limit,
    );
    serve(build_router(Arc::new(state), &[])).await
}

pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server runs");
    });
    format!("http://{addr}")
}

/// One parsed server-sent event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub name: String,
    pub data: Value,
}

/// Parses a complete `text/event-stream` body, skipping comments.
pub fn parse_sse(body: &str) -> Vec<SseEvent> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut name = None;
            let mut data = String::new();
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    name = Some(value.trim().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push_str(value.trim_start());
                }
            }
            let name = name?;
            let data = serde_json::from_str(&data).unwrap_or(Value::String(data));
            Some(SseEvent { name, data })
        })
        .collect()
}
