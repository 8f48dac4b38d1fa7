// Agent pipeline tests - prompt to tool execution through the built-in packages
//
// The model is scripted; the tools, schemas, executor and estimator are real.

use serde_json::json;
use tokio::sync::mpsc;
use toolpipe_core::agent::{AgentError, AgentOutput, AgentRunner, ExecutionEvent, ExecutionState};
use toolpipe_core::estimator::calculate_token_breakdown_with;
use toolpipe_core::model::ModelResponse;
use toolpipe_core::types::MessageRole;
use toolpipe_log::LogLevel;

#[path = "../support/mod.rs"]
mod support;

use support::{ScriptedProvider, settings, tool_call};

#[tokio::test]
async fn lead_score_runs_end_to_end() {
    let definition = support::definition_for("@toolpipe/lead-score");
    let provider = ScriptedProvider::new(vec![
        tool_call(
            definition.name(),
            json!({
                "lead": {
                    "companySize": 250,
                    "industry": "SaaS",
                    "jobTitle": "VP of Engineering",
                    "budgetConfirmed": true,
                    "timeline": "this quarter",
                    "activities": [{"type": "demo_request", "count": 1}]
                }
            }),
        ),
        ModelResponse::new("The lead scored well."),
    ]);
    let runner = AgentRunner::new(provider.clone(), settings(5));

    let outcome = runner
        .run("Score this lead for me", &definition)
        .await
        .expect("run succeeds");

    let AgentOutput::Tool(output) = &outcome.output else {
        panic!("expected tool output, got {:?}", outcome.output);
    };
    let score = output["score"].as_u64().expect("numeric score");
    assert!(score <= 100);
    assert!(output["grade"].is_string());
    assert_eq!(outcome.text, "The lead scored well.");
    assert_eq!(outcome.agent_steps, 2);

    let requests = provider.requests.lock().unwrap();
    let first = &requests[0];
    assert_eq!(first.provider, "scripted");
    assert_eq!(first.model, "test-model");
    assert_eq!(first.messages[0].role, MessageRole::User);
    assert_eq!(first.messages[0].content, "Score this lead for me");
    assert_eq!(first.tools.len(), 1);
    assert_eq!(first.tools[0].parameters["required"], json!(["lead"]));
}

#[tokio::test]
async fn token_breakdown_matches_estimator() {
    let definition = support::definition_for(support::TEXT_CHUNK);
    let provider = ScriptedProvider::new(vec![
        tool_call(definition.name(), json!({"text": "First. Second."})),
        ModelResponse::new("Two sentences, one chunk."),
    ]);
    let runner = AgentRunner::new(provider, settings(5));

    let outcome = runner.run("  chunk it  ", &definition).await.unwrap();
    let expected = calculate_token_breakdown_with(
        &runner.settings().pricing,
        "chunk it",
        definition.description(),
        definition.parameters(),
        definition.returns(),
        "Two sentences, one chunk.",
    );
    assert_eq!(outcome.tokens, expected);
    assert!(outcome.tokens.estimated_cost > 0.0);
}

#[tokio::test]
async fn silent_model_is_billed_for_rendered_tool_output() {
    let definition = support::definition_for(support::TEXT_CHUNK);
    let provider = ScriptedProvider::new(vec![
        tool_call(definition.name(), json!({"text": "Only one."})),
        ModelResponse::new(""),
    ]);
    let runner = AgentRunner::new(provider, settings(5));

    let outcome = runner.run("chunk", &definition).await.unwrap();
    assert!(outcome.text.is_empty());
    let expected = calculate_token_breakdown_with(
        &runner.settings().pricing,
        "chunk",
        definition.description(),
        definition.parameters(),
        definition.returns(),
        &outcome.output.render(),
    );
    assert_eq!(outcome.tokens.output_tokens, expected.output_tokens);
    assert!(outcome.tokens.output_tokens > 0);
}

#[tokio::test]
async fn unknown_tool_name_is_answered_with_an_error() {
    let definition = support::definition_for(support::TEXT_CHUNK);
    let provider = ScriptedProvider::new(vec![
        tool_call("some_other_tool", json!({})),
        ModelResponse::new("Sorry."),
    ]);
    let runner = AgentRunner::new(provider.clone(), settings(5));

    let outcome = runner.run("chunk", &definition).await.unwrap();
    let AgentOutput::Tool(output) = outcome.output else {
        panic!("expected the error payload as tool output");
    };
    assert!(output["error"].as_str().unwrap().contains("some_other_tool"));
    assert!(
        outcome
            .log
            .at_least(LogLevel::Warn)
            .any(|entry| entry.message.contains("unknown tool"))
    );

    let requests = provider.requests.lock().unwrap();
    let answer = requests[1].messages.last().unwrap();
    assert_eq!(answer.role, MessageRole::Tool);
}

#[tokio::test]
async fn tool_failure_is_reported_to_the_model() {
    let definition = support::definition_for(support::TEXT_CHUNK);
    let provider = ScriptedProvider::new(vec![
        tool_call(
            definition.name(),
            json!({"text": "a. b.", "maxChunkSize": 10, "overlap": 50}),
        ),
        ModelResponse::new("That did not work."),
    ]);
    let runner = AgentRunner::new(provider.clone(), settings(5));

    let outcome = runner.run("chunk", &definition).await.unwrap();
    let AgentOutput::Tool(output) = outcome.output else {
        panic!("expected tool output");
    };
    assert!(output["error"].is_string());
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn model_error_fails_the_run() {
    let definition = support::definition_for(support::TEXT_CHUNK);
    let runner = AgentRunner::new(ScriptedProvider::new(Vec::new()), settings(5));

    let err = runner.run("chunk", &definition).await.unwrap_err();
    assert!(matches!(err, AgentError::Model(_)));
    assert!(!err.user_message().is_empty());
}

#[tokio::test]
async fn streamed_run_delivers_ordered_events() {
    let definition = support::definition_for(support::TEXT_CHUNK);
    let provider = ScriptedProvider::new(vec![
        tool_call(definition.name(), json!({"text": "Alpha. Beta."})),
        ModelResponse::new("Split into one chunk."),
    ]);
    let runner = AgentRunner::new(provider, settings(5));
    let (tx, mut rx) = mpsc::channel(16);

    let finished = runner
        .run_streaming("chunk", &definition, tx)
        .await
        .expect("stream succeeds");
    assert_eq!(finished.state(), ExecutionState::Completed);
    assert_eq!(finished.steps(), 2);
    assert!(!finished.log().is_empty());

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    let names: Vec<&str> = events.iter().map(ExecutionEvent::name).collect();
    assert_eq!(
        names,
        ["chunk", "chunk", "chunk", "chunk", "tokens", "complete"]
    );
    assert!(events.last().unwrap().is_terminal());
    assert!(events.iter().filter(|e| e.is_terminal()).count() == 1);
}

#[tokio::test]
async fn streamed_empty_prompt_emits_single_error() {
    let definition = support::definition_for(support::TEXT_CHUNK);
    let provider = ScriptedProvider::new(vec![ModelResponse::new("unused")]);
    let runner = AgentRunner::new(provider.clone(), settings(5));
    let (tx, mut rx) = mpsc::channel(4);

    let err = runner.run_streaming(" ", &definition, tx).await.unwrap_err();
    assert!(matches!(err, AgentError::EmptyPrompt));
    let event = rx.recv().await.expect("error event");
    assert_eq!(event.name(), "error");
    assert!(rx.recv().await.is_none());
    assert_eq!(provider.request_count(), 0);
}
