//! Integration tests for the Kimi chat completions provider

mod common;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kimi_agent::config::ModelConfig;
use kimi_agent::error::KimiError;
use kimi_agent::providers::{KimiProvider, Message, Provider};

fn provider_for(server: &MockServer) -> KimiProvider {
    KimiProvider::new(ModelConfig {
        api_key: "sk-test".to_string(),
        base_url: format!("{}/v1", server.uri()),
        ..Default::default()
    })
    .expect("provider should build")
}

#[tokio::test]
async fn test_completion_sends_model_messages_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::completion_body("Hello!")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let response = provider
        .complete(&[Message::system("be nice"), Message::user("hi")], 0.7)
        .await
        .unwrap();

    let usage = response.usage.expect("usage should be parsed");
    assert_eq!(usage.prompt_tokens, 12);
    assert_eq!(usage.completion_tokens, 3);
    assert_eq!(response.content.as_deref(), Some("Hello!"));

    let requests = common::completion_requests(&server).await;
    assert_eq!(requests.len(), 1);
    let body = &requests[0];
    assert_eq!(body["model"], "moonshot-v1-8k");
    assert_eq!(body["stream"], false);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "be nice"},
            {"role": "user", "content": "hi"}
        ])
    );
}

#[tokio::test]
async fn test_null_content_is_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let response = provider_for(&server)
        .complete(&[Message::user("hi")], 0.7)
        .await
        .unwrap();
    assert_eq!(response.into_text(), "");
}

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .complete(&[Message::user("hi")], 0.7)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<KimiError>(),
        Some(KimiError::Authentication(msg)) if msg.contains("invalid api key")
    ));
}

#[tokio::test]
async fn test_server_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .complete(&[Message::user("hi")], 0.7)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("429"), "unexpected error: {}", message);
    assert!(message.contains("rate limited"), "unexpected error: {}", message);
    assert!(matches!(
        err.downcast_ref::<KimiError>(),
        Some(KimiError::Provider(_))
    ));
}

#[tokio::test]
async fn test_missing_choices_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .complete(&[Message::user("hi")], 0.7)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no choices"));
}
