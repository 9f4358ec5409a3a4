//! Integration tests for the LLM backends against a mocked HTTP server.
//!
//! Each adapter is checked for the request it sends and for how it maps
//! failures onto `ProviderError`.

use commitgen::error::ProviderError;
use commitgen::llm::{
    AnthropicProvider, GeminiProvider, OllamaProvider, OpenAiProvider, Provider,
};
use commitgen::prompt::NeutralMessage;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

fn messages() -> Vec<NeutralMessage> {
    vec![
        NeutralMessage::system("You write commit messages."),
        NeutralMessage::user("diff --git a/x b/x"),
    ]
}

// =============================================================================
// OPENAI-COMPATIBLE
// =============================================================================

#[tokio::test]
async fn test_openai_request_shape_and_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.2,
            "messages": [
                {"role": "system", "content": "You write commit messages."},
                {"role": "user", "content": "diff --git a/x b/x"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "```text\nAdd x\n```"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(client(), "gpt-4o-mini")
        .with_endpoint(format!("{}/v1/", server.uri()))
        .with_api_key("sk-test");

    let answer = provider.generate(&messages(), 0.2).await.unwrap();
    assert_eq!(answer, "```text\nAdd x\n```");
}

#[tokio::test]
async fn test_openai_without_key_sends_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(client(), "local").with_endpoint(server.uri());
    provider.generate(&messages(), 0.0).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_openai_no_choices_is_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(client(), "m").with_endpoint(server.uri());
    let err = provider.generate(&messages(), 0.2).await.unwrap_err();

    assert!(matches!(err, ProviderError::EmptyResult { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_openai_blank_or_null_content_is_empty_result() {
    for content in [json!(""), json!("  \n"), json!(null)] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(client(), "m").with_endpoint(server.uri());
        let err = provider.generate(&messages(), 0.2).await.unwrap_err();

        assert!(
            matches!(err, ProviderError::EmptyResult { .. }),
            "content {content} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn test_openai_error_object_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "model not found", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(client(), "m").with_endpoint(server.uri());
    let err = provider.generate(&messages(), 0.2).await.unwrap_err();

    match err {
        ProviderError::Api { provider, message } => {
            assert_eq!(provider, "openai");
            assert!(message.contains("model not found"));
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_non_success_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(client(), "m").with_endpoint(server.uri());
    let err = provider.generate(&messages(), 0.2).await.unwrap_err();

    match err {
        ProviderError::Status { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("Expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(client(), "m").with_endpoint(server.uri());
    let err = provider.generate(&messages(), 0.2).await.unwrap_err();

    assert!(matches!(err, ProviderError::Decode { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let provider =
        OpenAiProvider::new(client(), "m").with_endpoint(format!("http://127.0.0.1:{port}"));
    let err = provider.generate(&messages(), 0.2).await.unwrap_err();

    assert!(matches!(err, ProviderError::Transport { .. }));
    assert!(!err.is_retryable());
}

// =============================================================================
// OLLAMA
// =============================================================================

#[tokio::test]
async fn test_ollama_request_shape_and_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3",
            "stream": false,
            "options": {"temperature": 0.5},
            "messages": [
                {"role": "system", "content": "You write commit messages."},
                {"role": "user", "content": "diff --git a/x b/x"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3",
            "message": {"role": "assistant", "content": "Add x"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(client(), "llama3").with_endpoint(server.uri());
    let answer = provider.generate(&messages(), 0.5).await.unwrap();
    assert_eq!(answer, "Add x");
}

#[tokio::test]
async fn test_ollama_missing_message_is_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(client(), "llama3").with_endpoint(server.uri());
    let err = provider.generate(&messages(), 0.5).await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResult { .. }));
}

// =============================================================================
// ANTHROPIC
// =============================================================================

#[tokio::test]
async fn test_anthropic_request_shape_and_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "max_tokens": 1024,
            "system": "You write commit messages.",
            "messages": [{"role": "user", "content": "diff --git a/x b/x"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "Add x"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        AnthropicProvider::new(client(), "claude-test", "ak-test").with_endpoint(server.uri());
    let answer = provider.generate(&messages(), 0.2).await.unwrap();
    assert_eq!(answer, "Add x");
}

#[tokio::test]
async fn test_anthropic_empty_content_is_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(client(), "claude-test", "k").with_endpoint(server.uri());
    let err = provider.generate(&messages(), 0.2).await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResult { .. }));
}

#[tokio::test]
async fn test_anthropic_rate_limit_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(client(), "claude-test", "k").with_endpoint(server.uri());
    let err = provider.generate(&messages(), 0.2).await.unwrap_err();
    assert!(matches!(err, ProviderError::Status { status: 429, .. }));
}

// =============================================================================
// GEMINI
// =============================================================================

#[tokio::test]
async fn test_gemini_request_shape_and_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(query_param("key", "gk-test"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "You write commit messages."}]},
            "contents": [{"role": "user", "parts": [{"text": "diff --git a/x b/x"}]}],
            "generationConfig": {"temperature": 0.2}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Add x"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        GeminiProvider::new(client(), "gemini-test", "gk-test").with_endpoint(server.uri());
    let answer = provider.generate(&messages(), 0.2).await.unwrap();
    assert_eq!(answer, "Add x");
}

#[tokio::test]
async fn test_gemini_no_candidates_is_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(client(), "gemini-test", "k").with_endpoint(server.uri());
    let err = provider.generate(&messages(), 0.2).await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResult { .. }));
}

#[tokio::test]
async fn test_gemini_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(client(), "gemini-test", "k").with_endpoint(server.uri());
    let err = provider.generate(&messages(), 0.2).await.unwrap_err();
    assert!(matches!(err, ProviderError::Decode { .. }));
}
