// Server route tests - health, listings and the JSON envelope

use serde_json::Value;
use toolpipe_core::config::RateLimitConfig;

#[path = "../support/mod.rs"]
mod support;

use support::ScriptedProvider;

async fn server() -> String {
    support::spawn_server(ScriptedProvider::new(Vec::new()), RateLimitConfig::default()).await
}

async fn get_json(url: &str) -> (reqwest::StatusCode, Value) {
    let response = reqwest::get(url).await.expect("request succeeds");
    let status = response.status();
    (status, response.json().await.expect("json body"))
}

#[tokio::test]
async fn health_reports_ok() {
    let base = server().await;
    let (status, body) = get_json(&format!("{base}/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn tools_are_listed_in_an_envelope() {
    let base = server().await;
    let (status, body) = get_json(&format!("{base}/api/tools?page=1&limit=4")).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(body["pagination"]["total"], 10);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["hasMore"], true);
    assert!(body["meta"]["requestId"].is_string());
    assert!(body["meta"]["timestamp"].is_string());

    let first = &body["data"][0];
    assert!(first["packageName"].as_str().unwrap().starts_with("@toolpipe/"));
    assert!(first["exportName"].is_string());
    assert!(first["parameters"].is_array());
}

#[tokio::test]
async fn listing_past_the_end_is_empty() {
    let base = server().await;
    let (status, body) = get_json(&format!("{base}/api/packages?page=50")).await;
    assert_eq!(status, 200);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn scoped_package_can_be_fetched_by_name() {
    let base = server().await;
    let (status, body) = get_json(&format!("{base}/api/packages/@toolpipe/text-chunk")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "@toolpipe/text-chunk");
    assert_eq!(body["data"]["tools"][0]["exportName"], "textChunk");
    assert!(body.get("pagination").is_none());
}

#[tokio::test]
async fn unknown_package_is_a_not_found_envelope() {
    let base = server().await;
    let (status, body) = get_json(&format!("{base}/api/packages/@nobody/nothing")).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("@nobody/nothing")
    );
}

#[tokio::test]
async fn openapi_document_is_served() {
    let base = server().await;
    let (status, body) = get_json(&format!("{base}/api-doc/openapi.json")).await;
    assert_eq!(status, 200);
    assert!(body["paths"]["/api/tools"].is_object());
    assert!(body["paths"]["/health"].is_object());
}
