/*!
 * Core translation service implementation.
 *
 * `TranslationService` turns a configured provider into a [`Translator`]:
 * one request per string, with a system prompt naming both languages and an
 * in-memory cache in front of the provider.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::language_utils;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::Provider;
use super::cache::TranslationCache;
use super::Translator;

/// Token usage statistics for tracking API consumption
#[derive(Clone, Debug)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Number of provider requests made
    pub requests: u64,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl TokenUsageStats {
    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            requests: 0,
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Record one finished request
    pub fn record(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>, duration: Duration) {
        self.prompt_tokens += prompt_tokens.unwrap_or(0);
        self.completion_tokens += completion_tokens.unwrap_or(0);
        self.requests += 1;
        self.api_duration += duration;
    }

    /// Total number of tokens
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    /// One-line summary for the log
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} requests, {} prompt + {} completion tokens, {:.1}s in API calls",
            self.provider,
            self.model,
            self.requests,
            self.prompt_tokens,
            self.completion_tokens,
            self.api_duration.as_secs_f64()
        )
    }
}

/// Check that an endpoint is an absolute http(s) URL, adding `http://` when no scheme is given
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Translation provider implementation variants
#[derive(Debug)]
enum TranslationProviderImpl {
    /// Ollama LLM service
    Ollama { client: Ollama },

    /// OpenAI API service
    OpenAI { client: OpenAI },

    /// LM Studio local server (OpenAI-compatible)
    LMStudio { client: OpenAI },

    /// Anthropic API service
    Anthropic { client: Anthropic },
}

/// Provider-backed translation service
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    /// Translation cache for storing and retrieving translations
    pub cache: TranslationCache,

    usage: Mutex<TokenUsageStats>,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let endpoint = normalize_endpoint(&config.get_endpoint())?;
        let retry_count = config.common.retry_count;
        let retry_backoff_ms = config.common.retry_backoff_ms;
        let timeout_secs = config.get_timeout_secs();

        let provider = match config.provider {
            ConfigTranslationProvider::Ollama => TranslationProviderImpl::Ollama {
                client: Ollama::new_with_config(endpoint, retry_count, retry_backoff_ms, timeout_secs),
            },
            ConfigTranslationProvider::OpenAI => TranslationProviderImpl::OpenAI {
                client: OpenAI::new_with_config(
                    config.get_api_key(),
                    endpoint,
                    retry_count,
                    retry_backoff_ms,
                    timeout_secs,
                ),
            },
            ConfigTranslationProvider::LMStudio => {
                // LM Studio does not check the key but the header must be present
                let api_key = match config.get_api_key() {
                    key if key.is_empty() => "lm-studio".to_string(),
                    key => key,
                };

                TranslationProviderImpl::LMStudio {
                    client: OpenAI::new_with_config(api_key, endpoint, retry_count, retry_backoff_ms, timeout_secs),
                }
            },
            ConfigTranslationProvider::Anthropic => TranslationProviderImpl::Anthropic {
                client: Anthropic::new_with_config(
                    config.get_api_key(),
                    endpoint,
                    retry_count,
                    retry_backoff_ms,
                    timeout_secs,
                ),
            },
        };

        let usage = TokenUsageStats::with_provider_info(
            config.provider.display_name().to_string(),
            config.get_model(),
        );

        Ok(Self {
            provider,
            config,
            cache: TranslationCache::new(true),
            usage: Mutex::new(usage),
        })
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<()> {
        info!(
            "Testing connection to {} with model {}",
            self.config.provider.display_name(),
            self.config.get_model()
        );

        let result = match &self.provider {
            TranslationProviderImpl::Ollama { client } => client.test_connection().await,
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                client.test_connection().await
            },
            TranslationProviderImpl::Anthropic { client } => client.test_connection().await,
        };

        result.map_err(|e| anyhow!("Failed to connect to {}: {}", self.config.provider.display_name(), e))
    }

    /// Render the system prompt for a language pair
    pub fn system_prompt(&self, source_language: &str, target_language: &str) -> String {
        self.config.common.system_prompt
            .replace("{source_language}", &language_utils::display_language(source_language))
            .replace("{target_language}", &language_utils::display_language(target_language))
    }

    /// Snapshot of the token usage so far
    pub fn usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }

    /// Translate a single text string
    pub async fn translate_text(&self, text: &str, source_language: &str, target_language: &str) -> Result<String> {
        // Whitespace needs no translation
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        if let Some(cached) = self.cache.get(text, source_language, target_language) {
            return Ok(cached);
        }

        let system_prompt = self.system_prompt(source_language, target_language);
        let model = self.config.get_model();
        let temperature = self.config.common.temperature;
        let max_tokens = max_tokens_for_text(text);
        let start_time = Instant::now();

        let (translated, prompt_tokens, completion_tokens) = match &self.provider {
            TranslationProviderImpl::Ollama { client } => {
                let request = GenerationRequest::new(model, text)
                    .system(system_prompt)
                    .temperature(temperature);

                let response = client.generate(request).await
                    .map_err(|e| anyhow!("Ollama translation error: {}", e))?;

                let prompt_tokens = response.prompt_eval_count;
                let completion_tokens = response.eval_count;
                (response.response, prompt_tokens, completion_tokens)
            },
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                let request = OpenAIRequest::new(model)
                    .add_message("system", system_prompt)
                    .add_message("user", text)
                    .temperature(temperature)
                    .max_tokens(max_tokens);

                let response = client.complete(request).await
                    .map_err(|e| anyhow!("OpenAI-compatible translation error: {}", e))?;

                if response.choices.is_empty() {
                    return Err(anyhow!("OpenAI-compatible provider returned empty response"));
                }

                let usage = response.usage.as_ref()
                    .map(|u| (u.prompt_tokens as u64, u.completion_tokens as u64));
                (
                    OpenAI::extract_text(&response),
                    usage.map(|(p, _)| p),
                    usage.map(|(_, c)| c),
                )
            },
            TranslationProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(model, max_tokens)
                    .system(system_prompt)
                    .add_message("user", text)
                    .temperature(temperature);

                let response = client.complete(request).await
                    .map_err(|e| anyhow!("Anthropic translation error: {}", e))?;

                (
                    Anthropic::extract_text(&response),
                    Some(response.usage.input_tokens as u64),
                    Some(response.usage.output_tokens as u64),
                )
            },
        };

        let duration = start_time.elapsed();
        debug!("{} response received in {:?}", self.config.provider.display_name(), duration);
        self.usage.lock().record(prompt_tokens, completion_tokens, duration);

        let translated = restore_outer_whitespace(text, translated.trim());
        self.cache.store(text, source_language, target_language, &translated);

        Ok(translated)
    }
}

#[async_trait]
impl Translator for TranslationService {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> anyhow::Result<String> {
        self.translate_text(text, source_language, target_language).await
    }
}

/// Completion budget for a single string: generous relative to the input,
/// bounded so a runaway model cannot stall a unit.
fn max_tokens_for_text(text: &str) -> u32 {
    let chars = text.chars().count() as u32;
    (chars.saturating_mul(4)).clamp(256, 4096)
}

/// Models drop leading and trailing whitespace; put the source's back
fn restore_outer_whitespace(source: &str, translated: &str) -> String {
    let leading = &source[..source.len() - source.trim_start().len()];
    let trailing = &source[source.trim_end().len()..];
    format!("{}{}{}", leading, translated, trailing)
}
