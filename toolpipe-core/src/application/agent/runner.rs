use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::errors::AgentError;
use super::events::ExecutionEvent;
use super::models::{AgentOutcome, AgentOutput, AgentSettings};
use super::state::{ActiveRun, FinishedRun, PendingRun, RunMode};
use crate::application::definition::ToolDefinition;
use crate::application::estimator::calculate_token_breakdown_with;
use crate::domain::tool::TokenBreakdown;
use crate::domain::types::{ChatMessage, ToolCall};
use crate::infrastructure::model::{
    ModelError, ModelProvider, ModelRequest, ModelResponse, ModelStreamEvent,
};

/// Runs prompts against a single bound tool.
pub struct AgentRunner<P: ModelProvider> {
    provider: Arc<P>,
    settings: AgentSettings,
}

/// Messages exchanged during one run.
struct Conversation {
    messages: Vec<ChatMessage>,
    text: String,
    last: ChatMessage,
}

impl Conversation {
    fn output(&self) -> AgentOutput {
        AgentOutput::from_conversation(&self.messages, &self.text, &self.last)
    }
}

impl<P: ModelProvider> AgentRunner<P> {
    pub fn new(provider: Arc<P>, settings: AgentSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Blocking run: returns once the model stops calling the tool.
    pub async fn run(
        &self,
        prompt: &str,
        definition: &ToolDefinition,
    ) -> Result<AgentOutcome, AgentError> {
        let prompt = require_prompt(prompt)?;
        info!(tool = definition.name(), "Agent run started");
        let mut run = PendingRun::new().start(RunMode::Blocking);

        let result = self.converse(prompt, definition, &mut run, None).await;
        let conversation = match result {
            Ok(conversation) => conversation,
            Err(err) => {
                warn!(tool = definition.name(), error = %err, "Agent run failed");
                run.fail(&err.to_string());
                return Err(err);
            }
        };

        let output = conversation.output();
        let tokens = self.tokens(prompt, definition, &conversation.text, &output);
        let finished = run.complete();
        info!(
            tool = definition.name(),
            agent_steps = finished.steps(),
            elapsed_ms = finished.execution_time_ms(),
            "Agent run completed"
        );

        Ok(AgentOutcome {
            output,
            text: conversation.text,
            tokens,
            agent_steps: finished.steps(),
            execution_time_ms: finished.execution_time_ms(),
            log: finished.into_log(),
        })
    }

    /// Streamed run: text deltas, then token usage and completion, are sent
    /// to `sink` in order. Failures are reported as an `error` event and
    /// returned.
    pub async fn run_streaming(
        &self,
        prompt: &str,
        definition: &ToolDefinition,
        sink: mpsc::Sender<ExecutionEvent>,
    ) -> Result<FinishedRun, AgentError> {
        let prompt = match require_prompt(prompt) {
            Ok(prompt) => prompt,
            Err(err) => {
                notify_failure(&sink, &err).await;
                return Err(err);
            }
        };
        info!(tool = definition.name(), "Streaming agent run started");
        let mut run = PendingRun::new().start(RunMode::Streaming);

        let result = self.converse(prompt, definition, &mut run, Some(&sink)).await;
        let conversation = match result {
            Ok(conversation) => conversation,
            Err(err) => {
                warn!(tool = definition.name(), error = %err, "Streaming agent run failed");
                run.fail(&err.to_string());
                notify_failure(&sink, &err).await;
                return Err(err);
            }
        };

        let output = conversation.output();
        let tokens = self.tokens(prompt, definition, &conversation.text, &output);
        let finished = run.complete();
        let complete = ExecutionEvent::Complete {
            execution_time_ms: finished.execution_time_ms(),
            agent_steps: finished.steps(),
        };
        if sink.send(ExecutionEvent::Tokens(tokens)).await.is_err()
            || sink.send(complete).await.is_err()
        {
            debug!("Event receiver closed before completion was delivered");
        }
        info!(
            tool = definition.name(),
            agent_steps = finished.steps(),
            elapsed_ms = finished.execution_time_ms(),
            "Streaming agent run completed"
        );
        Ok(finished)
    }

    async fn converse(
        &self,
        prompt: &str,
        definition: &ToolDefinition,
        run: &mut ActiveRun,
        sink: Option<&mpsc::Sender<ExecutionEvent>>,
    ) -> Result<Conversation, AgentError> {
        let mut messages = Vec::with_capacity(4);
        if let Some(system) = self
            .settings
            .system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let tools = vec![definition.spec()];
        let max_steps = self.settings.max_steps.max(1);
        let mut text = String::new();

        loop {
            let step = run.record_step();
            run.log().info(format!(
                "step {step}: asking {}/{}",
                self.settings.provider_id, self.settings.model
            ));
            debug!(step, messages = messages.len(), "Submitting agent turn to model provider");

            let request = ModelRequest {
                provider: self.settings.provider_id.clone(),
                model: self.settings.model.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
            };
            let response = match sink {
                Some(sink) => self.stream_turn(request, sink).await?,
                None => self.provider.chat(request).await?,
            };

            text.push_str(response.content());
            let calls = response.tool_calls().to_vec();
            let last = response.message;
            messages.push(last.clone());

            if calls.is_empty() {
                run.log().info("model answered without tool calls");
                return Ok(Conversation {
                    messages,
                    text,
                    last,
                });
            }

            for call in &calls {
                let content = call_tool(definition, call, run).await;
                messages.push(ChatMessage::tool_result(call.id.clone(), content));
            }

            if step >= max_steps {
                run.log()
                    .warn(format!("stopped after {step} model calls (max_steps)"));
                return Ok(Conversation {
                    messages,
                    text,
                    last,
                });
            }
        }
    }

    /// Forwards deltas of one streamed model call and returns its final response.
    async fn stream_turn(
        &self,
        request: ModelRequest,
        sink: &mpsc::Sender<ExecutionEvent>,
    ) -> Result<ModelResponse, AgentError> {
        let provider = request.provider.clone();
        let mut stream = self.provider.chat_stream(request).await?;

        while let Some(event) = stream.next().await {
            match event? {
                ModelStreamEvent::Delta(text) => {
                    if sink.send(ExecutionEvent::Chunk { text }).await.is_err() {
                        debug!("Event receiver closed; stopping run");
                        return Err(AgentError::Cancelled);
                    }
                }
                ModelStreamEvent::Finished(response) => return Ok(response),
            }
        }
        Err(ModelError::stream(provider, "stream ended without a final response").into())
    }

    fn tokens(
        &self,
        prompt: &str,
        definition: &ToolDefinition,
        text: &str,
        output: &AgentOutput,
    ) -> TokenBreakdown {
        let rendered = if text.is_empty() {
            output.render()
        } else {
            text.to_string()
        };
        calculate_token_breakdown_with(
            &self.settings.pricing,
            prompt,
            definition.description(),
            definition.parameters(),
            definition.returns(),
            &rendered,
        )
    }
}

/// Executes one requested call; failures become a JSON error for the model.
async fn call_tool(definition: &ToolDefinition, call: &ToolCall, run: &mut ActiveRun) -> String {
    if call.name != definition.name() {
        run.log()
            .warn(format!("model requested unknown tool '{}'", call.name));
        return json!({ "error": format!("Unknown tool '{}'", call.name) }).to_string();
    }

    match definition.execute(call.arguments.clone()).await {
        Ok(output) => {
            run.log().info(format!("tool '{}' succeeded", call.name));
            output.to_string()
        }
        Err(err) => {
            warn!(tool = call.name.as_str(), error = %err, "Tool call failed");
            run.log()
                .warn(format!("tool '{}' failed: {err}", call.name));
            json!({ "error": err.user_message() }).to_string()
        }
    }
}

fn require_prompt(prompt: &str) -> Result<&str, AgentError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(AgentError::EmptyPrompt);
    }
    Ok(trimmed)
}

async fn notify_failure(sink: &mpsc::Sender<ExecutionEvent>, err: &AgentError) {
    if matches!(err, AgentError::Cancelled) {
        return;
    }
    let event = ExecutionEvent::Error {
        message: err.user_message(),
    };
    if sink.send(event).await.is_err() {
        debug!("Event receiver closed before the error was delivered");
    }
}
