// Gemini client tests against a mock server
// Author: kelexine (https://github.com/kelexine)

use mockito::Matcher;
use rhgate::config::GeminiConfig;
use rhgate::error::GatewayError;
use rhgate::gemini::{GeminiClient, TextGenerator};
use serde_json::json;

const API_KEY: &str = "AIzaSyA1234567890abcdefghijklmnopqrs";

fn client_for(server: &mockito::Server) -> GeminiClient {
    let config = GeminiConfig {
        api_base_url: server.url(),
        default_model: "gemini-2.0-flash".to_string(),
        timeout_seconds: 5,
        api_key: None,
    };
    GeminiClient::new(&config, API_KEY, true).unwrap()
}

#[tokio::test]
async fn test_generate_returns_candidate_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-2.0-flash:generateContent")
        .match_header("x-goog-api-key", API_KEY)
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"role": "user", "parts": [{"text": "Cite this"}]}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "  Smith (2020).\n"}]},
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let text = client.generate("Cite this").await.unwrap();

    assert_eq!(text, "Smith (2020).");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_upstream_error_message_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.0-flash:generateContent")
        .with_status(429)
        .with_body(
            json!({"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}})
                .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.generate("hello").await.unwrap_err();

    match err {
        GatewayError::GeminiApi(message) => {
            assert!(message.contains("429"));
            assert!(message.contains("Resource has been exhausted"));
        }
        other => panic!("expected Gemini API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_key_is_redacted_from_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.0-flash:generateContent")
        .with_status(400)
        .with_body(format!("bad key {}", API_KEY))
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.generate("hello").await.unwrap_err();

    let message = err.to_string();
    assert!(!message.contains(API_KEY));
    assert!(message.contains("[REDACTED_API_KEY]"));
}

#[tokio::test]
async fn test_empty_candidate_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.0-flash:generateContent")
        .with_status(200)
        .with_body(json!({"candidates": []}).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.generate("hello").await.unwrap_err();
    assert!(matches!(err, GatewayError::GeminiApi(ref m) if m == "empty response"));
}

#[tokio::test]
async fn test_blocked_candidate_reports_finish_reason() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.0-flash:generateContent")
        .with_status(200)
        .with_body(
            json!({"candidates": [{"content": {"parts": []}, "finishReason": "SAFETY"}]}).to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.generate("hello").await.unwrap_err();
    assert!(matches!(err, GatewayError::GeminiApi(ref m) if m == "empty response (finish reason: SAFETY)"));
}
