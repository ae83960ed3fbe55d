/*!
 * Provider-specific concurrency defaults.
 *
 * How many unit translations may be in flight at once when the
 * configuration does not say otherwise.
 */

use crate::app_config::TranslationProvider;

/// Provider-specific concurrency profile with tuned defaults
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    /// Maximum concurrent requests
    pub max_concurrent_requests: usize,
    /// Whether the provider runs locally (no API key, no network cost)
    pub is_local: bool,
}

impl ProviderProfile {
    /// Get the default profile for a given provider
    pub fn for_provider(provider: &TranslationProvider) -> Self {
        match provider {
            // Local model, requests queue on the same GPU
            TranslationProvider::Ollama => Self {
                max_concurrent_requests: 2,
                is_local: true,
            },
            TranslationProvider::OpenAI => Self {
                max_concurrent_requests: 8,
                is_local: false,
            },
            TranslationProvider::Anthropic => Self {
                max_concurrent_requests: 5,
                is_local: false,
            },
            TranslationProvider::LMStudio => Self {
                max_concurrent_requests: 2,
                is_local: true,
            },
        }
    }

    /// Get effective concurrent requests, respecting any user override
    pub fn effective_concurrent_requests(&self, user_override: Option<usize>) -> usize {
        user_override
            .filter(|&requests| requests > 0)
            .unwrap_or(self.max_concurrent_requests)
    }
}
