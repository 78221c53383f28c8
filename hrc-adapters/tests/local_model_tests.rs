//! Integration tests for the local on-device model client

use hrc_adapters::LocalModel;
use hrc_core::backend::{Availability, BackendError, OnDeviceModel, SessionOptions};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options() -> SessionOptions {
    SessionOptions {
        system_instruction: "Output ONE word racing commands.".to_string(),
        languages: vec!["en".to_string()],
    }
}

async fn mount_tags(server: &MockServer, names: &[&str]) {
    let models: Vec<_> = names.iter().map(|n| json!({ "name": n })).collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_available_when_model_is_listed() {
    let server = MockServer::start().await;
    mount_tags(&server, &["llama3:8b", "gemma3:1b"]).await;

    let model = LocalModel::new(Some(&server.uri()), "gemma3:1b");
    assert_eq!(model.availability().await, Availability::Available);
}

#[tokio::test]
async fn test_downloadable_when_model_is_missing() {
    let server = MockServer::start().await;
    mount_tags(&server, &["llama3:8b"]).await;

    let model = LocalModel::new(Some(&server.uri()), "gemma3:1b");
    assert_eq!(model.availability().await, Availability::Downloadable);
}

#[tokio::test]
async fn test_unavailable_when_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let model = LocalModel::new(Some(&server.uri()), "gemma3:1b");
    assert_eq!(model.availability().await, Availability::Unavailable);
}

#[tokio::test]
async fn test_session_prompt_sends_schema_and_system() {
    let server = MockServer::start().await;
    let schema = json!({
        "type": "object",
        "properties": { "action": { "type": "string" } },
        "required": ["action"]
    });

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "gemma3:1b",
            "system": "Output ONE word racing commands.",
            "prompt": "Speed:80 LatG:1.50 Brake:0 Throttle:20",
            "format": schema.clone(),
            "stream": false
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "response": "{\"action\":\"STABILIZE\"}" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let model = LocalModel::new(Some(&server.uri()), "gemma3:1b");
    let session = model.create_session(options()).await.unwrap();
    let raw = session
        .prompt("Speed:80 LatG:1.50 Brake:0 Throttle:20", &schema)
        .await
        .unwrap();

    assert_eq!(raw, "{\"action\":\"STABILIZE\"}");
}

#[tokio::test]
async fn test_session_prompt_maps_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let model = LocalModel::new(Some(&server.uri()), "gemma3:1b");
    let session = model.create_session(options()).await.unwrap();
    let err = session.prompt("x", &json!({})).await.unwrap_err();

    assert_eq!(
        err,
        BackendError::Http {
            status: 404,
            message: "model not found".to_string()
        }
    );
}

#[tokio::test]
async fn test_session_prompt_rejects_blank_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "  " })))
        .mount(&server)
        .await;

    let model = LocalModel::new(Some(&server.uri()), "gemma3:1b");
    let session = model.create_session(options()).await.unwrap();
    let err = session.prompt("x", &json!({})).await.unwrap_err();

    assert_eq!(err, BackendError::EmptyResponse);
}
