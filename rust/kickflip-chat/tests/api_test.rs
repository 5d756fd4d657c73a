mod common;

use std::sync::Arc;

use common::{spawn_app, ScriptedDriver};
use kickflip_chat::config::AppConfig;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn driver() -> Arc<ScriptedDriver> {
    Arc::new(
        ScriptedDriver::new()
            .intent("hello", "greeting")
            .intent("where is my order?", "shipping_inquiry"),
    )
}

#[tokio::test]
async fn test_health_and_ready() {
    let (base, handle) = spawn_app(AppConfig::default(), driver()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client.get(format!("{base}/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["store"], "memory");

    handle.abort();
}

#[tokio::test]
async fn test_conversation_lifecycle() {
    let (base, handle) = spawn_app(AppConfig::default(), driver()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/v1/conversations"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let id = body["conversation_id"].as_str().unwrap().to_string();
    let conversation = format!("{base}/api/v1/conversations/{id}");

    let resp = client
        .post(format!("{conversation}/messages"))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert!(body["response"].as_str().unwrap().contains("Welcome to"));
    assert_eq!(body["actions"], json!([]));

    let resp = client
        .put(format!("{conversation}/preferences"))
        .json(&json!({ "style": "street", "budget": 80 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["preferences"]["style"], "street");
    assert_eq!(body["preferences"]["budget"], 80);

    let body: Value = client
        .get(&conversation)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message_count"], 1);
    assert_eq!(body["stage"], "greeting");
    assert_eq!(body["last_intent"], "greeting");
    assert_eq!(body["conversation_history"][0]["role"], "user");

    let resp = client.delete(&conversation).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "ended": true, "conversation_id": id }));

    let resp = client.get(&conversation).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = client
        .delete(&conversation)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ended"], false);

    handle.abort();
}

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let (base, handle) = spawn_app(AppConfig::default(), driver()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/v1/conversations/abc/messages"))
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_message");

    handle.abort();
}

#[tokio::test]
async fn test_message_creates_conversation_lazily() {
    let (base, handle) = spawn_app(AppConfig::default(), driver()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/v1/conversations/widget-42/messages"))
        .json(&json!({ "message": "where is my order?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["response"], "Happy to help with that!");

    let body: Value = client
        .get(format!("{base}/api/v1/conversations/widget-42"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["last_intent"], "shipping_inquiry");
    assert_eq!(body["last_message"], "where is my order?");

    handle.abort();
}

#[tokio::test]
async fn test_unknown_conversation_is_not_found() {
    let (base, handle) = spawn_app(AppConfig::default(), driver()).await;

    let resp = reqwest::Client::new()
        .get(format!("{base}/api/v1/conversations/missing"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    handle.abort();
}
