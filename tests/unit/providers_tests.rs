/*!
 * Provider tests that run without network access
 */

use xliffwai::providers::Provider;
use xliffwai::providers::anthropic::{Anthropic, AnthropicRequest};
use xliffwai::providers::mock::{MockProvider, MockRequest};
use xliffwai::providers::ollama::{GenerationRequest, Ollama};
use xliffwai::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};
use xliffwai::errors::ProviderError;

fn mock_request(text: &str) -> MockRequest {
    MockRequest {
        text: text.to_string(),
        source_language: "en".to_string(),
        target_language: "it".to_string(),
    }
}

#[test]
fn test_clients_shouldNormalizeEndpoints() {
    let ollama = Ollama::new("http://localhost:11434/");
    assert_eq!(ollama.base_url(), "http://localhost:11434");

    // Construction never touches the network
    let _openai = OpenAI::new("key", "");
    let _anthropic = Anthropic::new("key", "https://api.anthropic.com/");
}

#[test]
fn test_requestBuilders_shouldSerializeExpectedFields() {
    let ollama = serde_json::to_value(
        GenerationRequest::new("llama3.2:3b", "Hello").system("Translate").temperature(0.2),
    )
    .unwrap();
    assert_eq!(ollama["model"], "llama3.2:3b");
    assert_eq!(ollama["system"], "Translate");
    assert_eq!(ollama["stream"], false);

    let openai = serde_json::to_value(
        OpenAIRequest::new("gpt-4o-mini").add_message("system", "Translate").add_message("user", "Hello"),
    )
    .unwrap();
    assert_eq!(openai["messages"].as_array().unwrap().len(), 2);

    let anthropic = serde_json::to_value(AnthropicRequest::new("claude-3-haiku-20240307", 256).add_message("user", "Hello"))
        .unwrap();
    assert!(anthropic.get("system").is_none());
    assert_eq!(anthropic["max_tokens"], 256);
}

#[test]
fn test_openAiExtractText_withChoices_shouldReturnFirstMessage() {
    let payload = r#"{
        "choices": [{"message": {"role": "assistant", "content": "Ciao"}}],
        "usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}
    }"#;
    let response: OpenAIResponse = serde_json::from_str(payload).unwrap();

    assert_eq!(OpenAI::extract_text(&response), "Ciao");
}

#[tokio::test]
async fn test_mockProvider_behaviors_shouldMatchConfiguration() {
    let working = MockProvider::working();
    let response = working.complete(mock_request("Hello")).await.unwrap();
    assert_eq!(MockProvider::extract_text(&response), "[it] Hello");

    let empty = MockProvider::empty();
    let response = empty.complete(mock_request("Hello")).await.unwrap();
    assert!(response.text.is_empty());

    let failing = MockProvider::failing();
    let error = failing.complete(mock_request("Hello")).await.unwrap_err();
    assert!(matches!(error, ProviderError::ApiError { status_code: 500, .. }));
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_mockProvider_slow_shouldStillAnswer() {
    let slow = MockProvider::slow(5);
    let response = slow.complete(mock_request("Hello")).await.unwrap();
    assert_eq!(response.text, "[it] Hello");
    assert_eq!(slow.request_count(), 1);
}

#[tokio::test]
async fn test_ollama_withUnreachableServer_shouldReturnConnectionError() {
    let ollama = Ollama::new_with_config("http://127.0.0.1:9", 0, 10, 2);

    let result = ollama.test_connection().await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_)) | Err(ProviderError::RequestFailed(_))));
}
