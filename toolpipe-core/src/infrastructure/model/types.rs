//! Model types - Request, Response, stream events and Error types

use std::pin::Pin;

use futures::Stream;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::types::{ChatMessage, ToolCall};

/// A function the model is allowed to call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Model request for LLM chat
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub provider: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSpec>,
}

/// Model response from LLM
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub message: ChatMessage,
}

impl ModelResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::assistant(content, Vec::new()),
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            message: ChatMessage::assistant(content, tool_calls),
        }
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.message.tool_calls
    }
}

/// One item of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStreamEvent {
    /// A piece of generated text, in provider order.
    Delta(String),
    /// The assembled response; always the last item of a successful stream.
    Finished(ModelResponse),
}

pub type ModelStream = Pin<Box<dyn Stream<Item = Result<ModelStreamEvent, ModelError>> + Send>>;

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' is not configured")]
    ProviderNotFound { provider: String },
    #[error("model '{model}' is not available for provider '{provider}'")]
    ModelNotFound { provider: String, model: String },
    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
    #[error("stream from provider '{provider}' failed: {reason}")]
    Stream { provider: String, reason: String },
}

impl ModelError {
    pub fn provider_not_found(provider: impl Into<String>) -> Self {
        Self::ProviderNotFound {
            provider: provider.into(),
        }
    }

    pub fn model_not_found(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            provider: provider.into(),
            model: model.into(),
        }
    }

    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn stream(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Stream {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Message suitable for API callers and the CLI.
    pub fn user_message(&self) -> String {
        match self {
            ModelError::ProviderNotFound { provider } => format!(
                "Model provider '{provider}' was not found. Check the [[providers]] section of toolpipe.toml."
            ),
            ModelError::ModelNotFound { provider, model } => {
                format!("Model '{model}' is not available on provider '{provider}'.")
            }
            ModelError::MissingApiKey { provider } => {
                format!("Provider '{provider}' requires an API key.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to model provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("Request to '{provider}' timed out.")
                } else if let Some(status) = source.status() {
                    status_message(provider, status)
                } else {
                    format!("Network error talking to '{provider}'.")
                }
            }
            ModelError::InvalidResponse { provider, .. } => {
                format!("Response from '{provider}' was not valid.")
            }
            ModelError::Stream { provider, reason } => {
                format!("Streaming from '{provider}' failed: {reason}")
            }
        }
    }
}

pub(crate) fn status_message(provider: &str, status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => format!("Endpoint of '{provider}' was not found."),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("Provider '{provider}' rejected the API key.")
        }
        StatusCode::TOO_MANY_REQUESTS => format!("Provider '{provider}' is rate limiting requests."),
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            format!("Provider '{provider}' is currently unavailable.")
        }
        _ => format!("Request to '{provider}' failed: {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_messages_are_specific() {
        assert!(status_message("p", StatusCode::NOT_FOUND).contains("not found"));
        assert!(status_message("p", StatusCode::UNAUTHORIZED).contains("API key"));
        assert!(status_message("p", StatusCode::IM_A_TEAPOT).ends_with("418"));
    }

    #[test]
    fn user_messages_name_the_provider() {
        let err = ModelError::model_not_found("local", "llama3");
        assert_eq!(
            err.user_message(),
            "Model 'llama3' is not available on provider 'local'."
        );
        assert!(ModelError::missing_api_key("openai").user_message().contains("openai"));
    }
}
