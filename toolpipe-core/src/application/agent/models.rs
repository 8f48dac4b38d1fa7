use serde::Serialize;
use serde_json::Value;
use toolpipe_log::ExecutionLog;

use crate::config::{AppConfig, Pricing};
use crate::domain::tool::TokenBreakdown;
use crate::domain::types::{ChatMessage, MessageRole};

/// Provider, model and limits applied to every run of an [`AgentRunner`](super::AgentRunner).
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub provider_id: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_steps: u32,
    pub pricing: Pricing,
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            provider_id: config.agent.default_provider.clone(),
            model: config.agent.model.clone(),
            system_prompt: config.agent.system_prompt.clone(),
            max_steps: u32::try_from(config.agent.max_steps).unwrap_or(u32::MAX),
            pricing: config.pricing,
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AgentOutput {
    /// Content of the last tool-role message.
    Tool(Value),
    /// Text generated by the model when no tool answered.
    Text(String),
    /// Raw final model message when it carried neither.
    Unrecognized(Value),
}

impl AgentOutput {
    /// Picks the last tool result, then the generated text, then the raw
    /// final message.
    pub fn from_conversation(messages: &[ChatMessage], text: &str, last: &ChatMessage) -> Self {
        if let Some(message) = messages
            .iter()
            .rev()
            .find(|message| message.role == MessageRole::Tool)
        {
            let value = serde_json::from_str(&message.content)
                .unwrap_or_else(|_| Value::String(message.content.clone()));
            return AgentOutput::Tool(value);
        }
        if !text.trim().is_empty() {
            return AgentOutput::Text(text.to_string());
        }
        AgentOutput::Unrecognized(serde_json::to_value(last).unwrap_or(Value::Null))
    }

    /// Text used for output-token estimation.
    pub fn render(&self) -> String {
        match self {
            AgentOutput::Text(text) => text.clone(),
            AgentOutput::Tool(Value::String(text)) => text.clone(),
            AgentOutput::Tool(value) | AgentOutput::Unrecognized(value) => value.to_string(),
        }
    }
}

/// Result of a blocking run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOutcome {
    pub output: AgentOutput,
    /// All text the model generated across steps.
    pub text: String,
    pub tokens: TokenBreakdown,
    pub agent_steps: u32,
    pub execution_time_ms: u64,
    pub log: ExecutionLog,
}
