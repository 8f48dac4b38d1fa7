// Execute endpoint tests - SSE streaming, validation and rate limiting

use serde_json::json;
use toolpipe_core::config::RateLimitConfig;
use toolpipe_core::model::ModelResponse;

#[path = "../support/mod.rs"]
mod support;

use support::{ScriptedProvider, parse_sse, tool_call};

const EXECUTE: &str = "/api/tools/execute/@toolpipe/text-chunk/textChunk";
const TOOL_NAME: &str = "toolpipe_text-chunk_textChunk";

fn limit(max_executions: u32) -> RateLimitConfig {
    RateLimitConfig {
        max_executions,
        window_secs: 60,
    }
}

async fn post(base: &str, path: &str, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .expect("request succeeds")
}

#[tokio::test]
async fn streams_chunks_tokens_and_complete() {
    let provider = ScriptedProvider::new(vec![
        tool_call(TOOL_NAME, json!({"text": "One. Two."})),
        ModelResponse::new("Done splitting."),
    ]);
    let base = support::spawn_server(provider.clone(), limit(5)).await;

    let response = post(&base, EXECUTE, json!({"prompt": "split this"})).await;
    assert_eq!(response.status(), 200);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    assert_eq!(response.headers()["x-ratelimit-remaining"], "4");

    let events = parse_sse(&response.text().await.unwrap());
    let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["chunk", "chunk", "tokens", "complete"]);

    let text: String = events
        .iter()
        .filter(|e| e.name == "chunk")
        .map(|e| e.data["text"].as_str().unwrap())
        .collect();
    assert_eq!(text, "Done splitting.");

    let tokens = &events[2].data;
    assert_eq!(
        tokens["totalTokens"].as_u64().unwrap(),
        ["inputTokens", "toolDescTokens", "schemaTokens", "outputTokens"]
            .iter()
            .map(|key| tokens[*key].as_u64().unwrap())
            .sum::<u64>()
    );
    assert_eq!(events[3].data["agentSteps"], 2);
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn default_export_is_used_when_target_names_only_the_package() {
    let provider = ScriptedProvider::new(vec![ModelResponse::new("ok")]);
    let base = support::spawn_server(provider.clone(), limit(5)).await;

    let response = post(
        &base,
        "/api/tools/execute/@toolpipe/text-chunk",
        json!({"prompt": "hi"}),
    )
    .await;
    assert_eq!(response.status(), 200);
    let events = parse_sse(&response.text().await.unwrap());
    assert_eq!(events.last().unwrap().name, "complete");

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].tools[0].name, TOOL_NAME);
}

#[tokio::test]
async fn model_failure_is_a_single_error_event() {
    let base = support::spawn_server(ScriptedProvider::new(Vec::new()), limit(5)).await;

    let response = post(&base, EXECUTE, json!({"prompt": "split"})).await;
    assert_eq!(response.status(), 200);
    let events = parse_sse(&response.text().await.unwrap());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "error");
    assert!(events[0].data["message"].is_string());
}

#[tokio::test]
async fn empty_prompt_is_rejected() {
    let provider = ScriptedProvider::new(Vec::new());
    let base = support::spawn_server(provider.clone(), limit(5)).await;

    for body in [json!({"prompt": "   "}), json!({})] {
        let response = post(&base, EXECUTE, body).await;
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Prompt is required");
    }
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn malformed_json_body_is_rejected() {
    let base = support::spawn_server(ScriptedProvider::new(Vec::new()), limit(5)).await;
    let response = reqwest::Client::new()
        .post(format!("{base}{EXECUTE}"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_target_is_rejected() {
    let base = support::spawn_server(ScriptedProvider::new(Vec::new()), limit(5)).await;
    let response = post(&base, "/api/tools/execute/a/b/c", json!({"prompt": "x"})).await;
    assert_eq!(response.status(), 400);
    assert!(response.headers().get("x-ratelimit-remaining").is_none());
}

#[tokio::test]
async fn unknown_tool_is_not_found() {
    let base = support::spawn_server(ScriptedProvider::new(Vec::new()), limit(5)).await;

    let response = post(
        &base,
        "/api/tools/execute/@toolpipe/text-chunk/missing",
        json!({"prompt": "x"}),
    )
    .await;
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("missing"));

    let response = post(&base, "/api/tools/execute/nope", json!({"prompt": "x"})).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn rate_limit_rejects_after_budget_is_spent() {
    let provider = ScriptedProvider::new(vec![ModelResponse::new("a"), ModelResponse::new("b")]);
    let base = support::spawn_server(provider.clone(), limit(2)).await;

    for expected in ["1", "0"] {
        let response = post(&base, EXECUTE, json!({"prompt": "go"})).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["x-ratelimit-remaining"], expected);
        response.text().await.unwrap();
    }

    let response = post(&base, EXECUTE, json!({"prompt": "go"})).await;
    assert_eq!(response.status(), 429);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Rate limit"));
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn rate_limit_is_tracked_per_forwarded_client() {
    let base = support::spawn_server(
        ScriptedProvider::new(vec![ModelResponse::new("a"), ModelResponse::new("b")]),
        limit(1),
    )
    .await;
    let client = reqwest::Client::new();
    let send = |ip: &'static str| {
        client
            .post(format!("{base}{EXECUTE}"))
            .header("x-forwarded-for", format!("{ip}, 10.0.0.1"))
            .json(&json!({"prompt": "go"}))
            .send()
    };

    let first = send("203.0.113.7").await.unwrap();
    assert_eq!(first.status(), 200);
    first.text().await.unwrap();

    assert_eq!(send("203.0.113.7").await.unwrap().status(), 429);

    let other = send("198.51.100.2").await.unwrap();
    assert_eq!(other.status(), 200);
    other.text().await.unwrap();
}
