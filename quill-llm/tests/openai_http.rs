//! OpenAI-compatible provider against a mock HTTP server

use quill_llm::{ErrorKind, GenerationConfig, LlmProvider, OpenAIProvider, ProviderConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_for(server: &MockServer) -> OpenAIProvider {
    let config = ProviderConfig::openai("sk-test")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_timeout(5);
    OpenAIProvider::new(config).unwrap()
}

fn local_for(server: &MockServer) -> OpenAIProvider {
    let config = ProviderConfig::local(format!("{}/v1", server.uri()), "llama3").with_timeout(5);
    OpenAIProvider::new(config).unwrap()
}

fn completion(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
    })
}

#[tokio::test]
async fn test_generate_sends_expected_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.5,
            "stream": false,
            "messages": [
                {"role": "system", "content": "You are a terse assistant."},
                {"role": "user", "content": "Explain borrowing"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("References borrow without owning.")))
        .expect(1)
        .mount(&server)
        .await;

    let config = GenerationConfig::new("gpt-4o-mini")
        .with_temperature(0.5)
        .with_system_instruction("You are a terse assistant.");
    let text = openai_for(&server)
        .generate(&config, "Explain borrowing")
        .await
        .unwrap();

    assert_eq!(text, "References borrow without owning.");
}

#[tokio::test]
async fn test_local_server_gets_no_authorization_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "llama3"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hi")))
        .expect(1)
        .mount(&server)
        .await;

    let text = local_for(&server)
        .generate(&GenerationConfig::new("llama3"), "hello")
        .await
        .unwrap();
    assert_eq!(text, "hi");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_unauthorized_is_permanent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided: sk-test.", "type": "invalid_request_error", "code": "invalid_api_key"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = openai_for(&server)
        .generate(&GenerationConfig::new("gpt-4o"), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.message().starts_with("Authentication failed"));
    assert!(err.message().contains("Incorrect API key"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "20")
                .set_body_json(json!({"error": {"message": "Rate limit reached"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = openai_for(&server)
        .generate(&GenerationConfig::new("gpt-4o"), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Rate limited (retry after 20s)");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_temporary_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = openai_for(&server)
        .generate(&GenerationConfig::new("gpt-4o"), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.message(), "API error (503): upstream unavailable");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_empty_choices_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o",
            "choices": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = openai_for(&server)
        .generate(&GenerationConfig::new("gpt-4o"), "hello")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.message().contains("No choices"));
    assert!(!err.is_retryable());
}
