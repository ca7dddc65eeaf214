//! Gemini provider against a mock HTTP server

use quill_llm::{
    ErrorKind, GeminiProvider, GenerationConfig, LlmProvider, ProviderConfig,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn provider_for(server: &MockServer) -> GeminiProvider {
    let config = ProviderConfig::gemini("test-key")
        .with_base_url(format!("{}/v1beta", server.uri()))
        .with_timeout(5);
    GeminiProvider::new(config).unwrap()
}

fn config() -> GenerationConfig {
    GenerationConfig::new("gemini-2.5-flash")
        .with_temperature(0.4)
        .with_system_instruction("You are a terse assistant.")
}

#[tokio::test]
async fn test_generate_sends_expected_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Explain ownership"}]}],
            "systemInstruction": {"parts": [{"text": "You are a terse assistant."}]},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Each value "}, {"text": "has one owner."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 9, "candidatesTokenCount": 6, "totalTokenCount": 15},
            "modelVersion": "gemini-2.5-flash"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = provider_for(&server)
        .generate(&config(), "Explain ownership")
        .await
        .unwrap();

    assert_eq!(text, "Each value has one owner.");
}

#[tokio::test]
async fn test_invalid_key_surfaces_provider_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "API key not valid. Please pass a valid API key.", "status": "PERMISSION_DENIED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .generate(&config(), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.message().contains("API key not valid"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_quota_exhaustion_is_temporary() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "12")
                .set_body_json(json!({"error": {"code": 429, "message": "Resource has been exhausted"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .generate(&config(), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.is_retryable());
    assert!(err.message().contains("retry after 12s"));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .generate(&config(), "hello")
        .await
        .unwrap_err();

    assert!(err.message().contains("internal error"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_blocked_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .generate(&config(), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.message().contains("SAFETY"));
}

#[tokio::test]
async fn test_unsupported_model_never_reaches_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .generate(&GenerationConfig::new("gpt-4o"), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}

#[tokio::test]
async fn test_unauthenticated_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Request had invalid authentication credentials.", "status": "UNAUTHENTICATED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .generate(&config(), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.message().starts_with("Authentication failed"));
    assert!(err.message().contains("invalid authentication credentials"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_error_object_in_successful_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": 400, "message": "Invalid value at 'generation_config.temperature'"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .generate(&config(), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert_eq!(
        err.message(),
        "API error (400): Invalid value at 'generation_config.temperature'"
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_response_without_candidates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [],
            "modelVersion": "gemini-2.5-flash"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .generate(&config(), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert_eq!(err.message(), "Model returned no text");
}
