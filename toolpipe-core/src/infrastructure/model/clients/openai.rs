//! OpenAI-compatible client implementation
//!
//! Serves every configured provider type: `ollama` exposes the same
//! chat-completions endpoint and is called without authentication.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use super::base::HttpClientBase;
use crate::config::ModelProviderConfig;
use crate::domain::types::ToolCall;
use crate::infrastructure::model::adapter::{MessageAdapter, parse_arguments};
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::ModelClient;
use crate::infrastructure::model::types::{
    ModelError, ModelRequest, ModelResponse, ModelStream, ModelStreamEvent, status_message,
};

const DONE_MARKER: &str = "[DONE]";
const STREAM_BUFFER: usize = 64;

/// OpenAI-compatible client (works with OpenAI, Ollama, Groq, Mistral, etc.)
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    api_path: String,
    authenticated: bool,
}

impl OpenAIClient {
    pub fn new(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        api_path: impl Into<String>,
        api_key: Option<String>,
        authenticated: bool,
    ) -> Self {
        Self {
            base: HttpClientBase::new(id.into(), endpoint.into(), api_key),
            api_path: api_path.into(),
            authenticated,
        }
    }

    pub fn from_config(config: &ModelProviderConfig) -> Self {
        let api_key = resolve_api_key(&config.id, config.api_key.as_deref());
        Self::new(
            config.id.clone(),
            config.endpoint.clone(),
            config.api_path.clone(),
            api_key,
            !config.is_ollama(),
        )
    }

    fn payload(&self, request: &ModelRequest, stream: bool) -> OpenAIRequest {
        OpenAIRequest {
            model: request.model.clone(),
            messages: MessageAdapter::to_openai_format(&request.messages),
            tools: MessageAdapter::tools_to_openai(&request.tools),
            stream,
        }
    }
}

#[async_trait]
impl ModelClient for OpenAIClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.base.build_url(&self.api_path);
        let payload = self.payload(&request, false);

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: OpenAIResponse = if self.authenticated {
            self.base.post_with_bearer(&url, &payload).await?
        } else {
            self.base.post_no_auth(&url, &payload).await?
        };
        debug!("Received response from OpenAI-compatible provider");

        let message = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing message"))?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: parse_arguments(&call.function.arguments),
            })
            .collect();

        Ok(ModelResponse::with_tool_calls(
            message.content.unwrap_or_default(),
            tool_calls,
        ))
    }

    async fn chat_stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        let url = self.base.build_url(&self.api_path);
        let payload = self.payload(&request, true);

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            "Opening streamed request to OpenAI-compatible provider"
        );

        let builder = self
            .base
            .json_request(&url, &payload, self.authenticated)?
            .header("Accept", "text/event-stream");
        let source = EventSource::new(builder)
            .map_err(|e| ModelError::stream(&self.base.id, e.to_string()))?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(pump(self.base.id.clone(), source, tx));
        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

type StreamSender = mpsc::Sender<Result<ModelStreamEvent, ModelError>>;

/// Reads provider events until `[DONE]`, forwarding text deltas in order and
/// finishing with the assembled response.
async fn pump(provider: String, mut source: EventSource, tx: StreamSender) {
    let mut assembler = StreamAssembler::default();

    while let Some(event) = source.next().await {
        match event {
            Ok(Event::Open) => continue,
            Ok(Event::Message(message)) => {
                if message.data.trim() == DONE_MARKER {
                    break;
                }
                let chunk: StreamChunk = match serde_json::from_str(&message.data) {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        source.close();
                        let reason = format!("invalid chunk: {err}");
                        let _ = tx.send(Err(ModelError::stream(&provider, reason))).await;
                        return;
                    }
                };
                let Some(text) = assembler.absorb(chunk) else {
                    continue;
                };
                if tx.send(Ok(ModelStreamEvent::Delta(text))).await.is_err() {
                    debug!(provider = provider.as_str(), "Stream consumer went away");
                    source.close();
                    return;
                }
            }
            Err(reqwest_eventsource::Error::StreamEnded) => break,
            Err(err) => {
                warn!(provider = provider.as_str(), error = %err, "Provider stream failed");
                source.close();
                let _ = tx.send(Err(stream_error(&provider, err))).await;
                return;
            }
        }
    }

    source.close();
    let _ = tx
        .send(Ok(ModelStreamEvent::Finished(assembler.finish())))
        .await;
}

fn stream_error(provider: &str, err: reqwest_eventsource::Error) -> ModelError {
    match err {
        reqwest_eventsource::Error::Transport(source) => ModelError::network(provider, source),
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => {
            ModelError::stream(provider, status_message(provider, status))
        }
        other => ModelError::stream(provider, other.to_string()),
    }
}

#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Accumulates streamed text and tool-call fragments keyed by call index.
#[derive(Debug, Default)]
struct StreamAssembler {
    content: String,
    calls: BTreeMap<usize, PartialCall>,
}

impl StreamAssembler {
    fn absorb(&mut self, chunk: StreamChunk) -> Option<String> {
        let delta = chunk.choices.into_iter().next()?.delta;

        for fragment in delta.tool_calls.unwrap_or_default() {
            let call = self.calls.entry(fragment.index).or_default();
            if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
                call.id = Some(id);
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name {
                    call.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    call.arguments.push_str(&arguments);
                }
            }
        }

        let text = delta.content.filter(|text| !text.is_empty())?;
        self.content.push_str(&text);
        Some(text)
    }

    fn finish(self) -> ModelResponse {
        let calls = self
            .calls
            .into_iter()
            .map(|(index, call)| ToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{index}")),
                name: call.name,
                arguments: parse_arguments(&call.arguments),
            })
            .collect();
        ModelResponse::with_tool_calls(self.content, calls)
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIFunction,
}

#[derive(Deserialize)]
struct OpenAIFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    function: Option<FunctionDelta>,
}

#[derive(Deserialize)]
struct FunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}
