// Provider tests - DynamicModelProvider against a mock chat-completions endpoint

use std::sync::{Arc, Mutex};

use axum::http::header;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use toolpipe_core::agent::{AgentError, AgentOutput, AgentRunner, AgentSettings};
use toolpipe_core::config::{ModelInfo, ModelProviderConfig, Pricing};
use toolpipe_core::model::{DynamicModelProvider, ModelError};

#[path = "../support/mod.rs"]
mod support;

fn ollama(endpoint: &str) -> ModelProviderConfig {
    ModelProviderConfig {
        id: "local".into(),
        provider_type: "ollama".into(),
        endpoint: endpoint.to_string(),
        api_key: None,
        api_path: "/v1/chat/completions".into(),
        models: vec![ModelInfo {
            name: "llama3.1".into(),
            display_name: None,
        }],
    }
}

fn runner(endpoint: &str, model: &str) -> AgentRunner<DynamicModelProvider> {
    let provider = DynamicModelProvider::from_configs(&[ollama(endpoint)]);
    AgentRunner::new(
        Arc::new(provider),
        AgentSettings {
            provider_id: "local".into(),
            model: model.into(),
            system_prompt: Some("Call the tool.".into()),
            max_steps: 3,
            pricing: Pricing::default(),
        },
    )
}

#[tokio::test]
async fn blocking_run_round_trips_tool_calls_over_http() {
    let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
    let recorder = Arc::clone(&seen);
    let endpoint = support::serve(Router::new().route(
        "/v1/chat/completions",
        post(move |Json(body): Json<Value>| {
            let recorder = Arc::clone(&recorder);
            async move {
                let turn = {
                    let mut seen = recorder.lock().unwrap();
                    seen.push(body);
                    seen.len()
                };
                if turn == 1 {
                    Json(json!({
                        "choices": [{"message": {
                            "content": null,
                            "tool_calls": [{
                                "id": "call_7",
                                "type": "function",
                                "function": {
                                    "name": "toolpipe_text-chunk_textChunk",
                                    "arguments": "{\"text\":\"One. Two.\"}"
                                }
                            }]
                        }}]
                    }))
                } else {
                    Json(json!({"choices": [{"message": {"content": "Chunked."}}]}))
                }
            }
        }),
    ))
    .await;

    let definition = support::definition_for(support::TEXT_CHUNK);
    let outcome = runner(&endpoint, "llama3.1")
        .run("chunk this", &definition)
        .await
        .expect("run succeeds");

    assert!(matches!(outcome.output, AgentOutput::Tool(ref v) if v["totalChunks"] == 1));
    assert_eq!(outcome.text, "Chunked.");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0]["model"], "llama3.1");
    assert_eq!(seen[0]["messages"][0]["role"], "system");
    assert_eq!(
        seen[0]["tools"][0]["function"]["name"],
        "toolpipe_text-chunk_textChunk"
    );
    let messages = seen[1]["messages"].as_array().unwrap();
    let assistant = &messages[messages.len() - 2];
    assert_eq!(assistant["tool_calls"][0]["id"], "call_7");
    let tool = messages.last().unwrap();
    assert_eq!(tool["role"], "tool");
    assert_eq!(tool["tool_call_id"], "call_7");
}

#[tokio::test]
async fn streamed_run_forwards_provider_deltas() {
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Nothing \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"to chunk.\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let endpoint = support::serve(Router::new().route(
        "/v1/chat/completions",
        post(move || async move { ([(header::CONTENT_TYPE, "text/event-stream")], body) }),
    ))
    .await;

    let definition = support::definition_for(support::TEXT_CHUNK);
    let (tx, mut rx) = mpsc::channel(16);
    runner(&endpoint, "llama3.1")
        .run_streaming("hello", &definition, tx)
        .await
        .expect("stream succeeds");

    let mut chunks = Vec::new();
    let mut names = Vec::new();
    while let Some(event) = rx.recv().await {
        names.push(event.name());
        if event.name() == "chunk" {
            chunks.push(event.data()["text"].as_str().unwrap().to_string());
        }
    }
    assert_eq!(chunks, ["Nothing ", "to chunk."]);
    assert_eq!(names[names.len() - 2..], ["tokens", "complete"]);
}

#[tokio::test]
async fn unknown_model_is_rejected_before_any_request() {
    let definition = support::definition_for(support::TEXT_CHUNK);
    let err = runner("http://127.0.0.1:9", "not-configured")
        .run("chunk", &definition)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::Model(ModelError::ModelNotFound { .. })
    ));
}
