use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::tool::TokenBreakdown;

/// Progress of a streamed run, delivered in order.
///
/// A successful run emits `Chunk*`, then `Tokens`, then `Complete`. A failed
/// run ends with a single `Error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ExecutionEvent {
    Chunk {
        text: String,
    },
    Tokens(TokenBreakdown),
    #[serde(rename_all = "camelCase")]
    Complete {
        execution_time_ms: u64,
        agent_steps: u32,
    },
    Error {
        message: String,
    },
}

impl ExecutionEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            ExecutionEvent::Chunk { .. } => "chunk",
            ExecutionEvent::Tokens(_) => "tokens",
            ExecutionEvent::Complete { .. } => "complete",
            ExecutionEvent::Error { .. } => "error",
        }
    }

    /// SSE payload.
    pub fn data(&self) -> Value {
        match self {
            ExecutionEvent::Chunk { text } => json!({ "text": text }),
            ExecutionEvent::Tokens(tokens) => serde_json::to_value(tokens).unwrap_or(Value::Null),
            ExecutionEvent::Complete {
                execution_time_ms,
                agent_steps,
            } => json!({
                "executionTimeMs": execution_time_ms,
                "agentSteps": agent_steps,
            }),
            ExecutionEvent::Error { message } => json!({ "message": message }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionEvent::Complete { .. } | ExecutionEvent::Error { .. }
        )
    }
}
