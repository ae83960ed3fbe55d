/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration (also used for LM Studio)
 * - Anthropic: Anthropic API integration
 * - Mock: deterministic provider for tests
 */

use async_trait::async_trait;
use log::{error, warn};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    ///
    /// # Arguments
    /// * `response` - The response from the provider
    ///
    /// # Returns
    /// * `String` - The extracted text
    fn extract_text(response: &Self::Response) -> String;
}

/// Send an HTTP request, retrying transient failures with exponential backoff.
///
/// `send` is called once per attempt. Client errors (4xx other than 429) are
/// returned immediately.
pub(crate) async fn send_with_retry<F, Fut>(
    provider_name: &str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut send: F,
) -> Result<reqwest::Response, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;

    loop {
        let failure = match send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status().as_u16();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to get error response text".to_string());
                ProviderError::from_status(status, error_text)
            }
            Err(e) if e.is_timeout() || e.is_connect() => ProviderError::ConnectionError(e.to_string()),
            Err(e) => ProviderError::RequestFailed(e.to_string()),
        };

        if !failure.is_transient() || attempt >= max_retries {
            error!("{} API error: {} (attempt {}/{})", provider_name, failure, attempt + 1, max_retries + 1);
            return Err(failure);
        }

        attempt += 1;
        let backoff_ms = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
        warn!(
            "{} API error: {} - retrying in {}ms (attempt {}/{})",
            provider_name, failure, backoff_ms, attempt + 1, max_retries + 1
        );
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
    }
}

/// Decode a JSON response body
pub(crate) async fn parse_json<T: serde::de::DeserializeOwned>(
    provider_name: &str,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::ParseError(format!("{} response: {}", provider_name, e)))
}

/// Build the shared HTTP client with the configured timeout
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_default()
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
