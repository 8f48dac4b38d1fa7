//! Message adapters - convert domain messages and tools to the OpenAI wire format

use serde_json::{Map, Value, json};

use super::types::ToolSpec;
use crate::domain::types::{ChatMessage, MessageRole, ToolCall};

/// Adapter for converting messages to the chat-completions format
pub struct MessageAdapter;

impl MessageAdapter {
    /// Convert messages to OpenAI-style format.
    ///
    /// Assistant tool calls carry their arguments as a JSON string, and tool
    /// results reference the call they answer.
    pub fn to_openai_format(messages: &[ChatMessage]) -> Vec<Value> {
        messages.iter().map(Self::message).collect()
    }

    /// `[{type: "function", function: {name, description, parameters}}]`
    pub fn tools_to_openai(tools: &[ToolSpec]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect()
    }

    fn message(msg: &ChatMessage) -> Value {
        let mut object = Map::new();
        object.insert("role".into(), json!(msg.role.as_str()));
        object.insert("content".into(), json!(msg.content));
        if msg.role == MessageRole::Assistant && !msg.tool_calls.is_empty() {
            let calls: Vec<Value> = msg.tool_calls.iter().map(Self::tool_call).collect();
            object.insert("tool_calls".into(), Value::Array(calls));
        }
        if let Some(call_id) = &msg.tool_call_id {
            object.insert("tool_call_id".into(), json!(call_id));
        }
        Value::Object(object)
    }

    fn tool_call(call: &ToolCall) -> Value {
        let arguments = match &call.arguments {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        };
        json!({
            "id": call.id,
            "type": "function",
            "function": {"name": call.name, "arguments": arguments},
        })
    }
}

/// Parses a function-call argument string; unparsable text is kept verbatim
/// so that schema validation reports it.
pub fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_messages_keep_role_and_content() {
        let formatted = MessageAdapter::to_openai_format(&[
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
        ]);
        assert_eq!(formatted[0], json!({"role": "system", "content": "be brief"}));
        assert_eq!(formatted[1], json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn tool_round_trip_is_linked_by_call_id() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "acme_pdf".into(),
            arguments: json!({"url": "x"}),
        };
        let formatted = MessageAdapter::to_openai_format(&[
            ChatMessage::assistant("", vec![call]),
            ChatMessage::tool_result("call_1", "{\"ok\":true}"),
        ]);
        assert_eq!(
            formatted[0]["tool_calls"][0]["function"]["arguments"],
            "{\"url\":\"x\"}"
        );
        assert_eq!(formatted[1]["role"], "tool");
        assert_eq!(formatted[1]["tool_call_id"], "call_1");
    }

    #[test]
    fn tools_are_wrapped_as_functions() {
        let tools = MessageAdapter::tools_to_openai(&[ToolSpec {
            name: "t".into(),
            description: "d".into(),
            parameters: json!({"type": "object"}),
        }]);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn arguments_fall_back_to_raw_text() {
        assert_eq!(parse_arguments(""), json!({}));
        assert_eq!(parse_arguments("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_arguments("{broken"), json!("{broken"));
    }
}
