/*!
 * Translation capability used by the XLIFF merge engine.
 *
 * - `core`: the provider-backed `TranslationService`
 * - `cache`: in-memory cache of finished translations
 * - `concurrency`: per-provider concurrency defaults
 */

use async_trait::async_trait;
use std::sync::Arc;

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::core::{TokenUsageStats, TranslationService};

pub mod cache;
pub mod concurrency;
pub mod core;

/// Something that can translate a single string.
///
/// The merge engine only depends on this trait, so the real provider-backed
/// service and deterministic test doubles are interchangeable.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_language` to `target_language`
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl<T: Translator + ?Sized> Translator for Arc<T> {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> anyhow::Result<String> {
        (**self).translate(text, source_language, target_language).await
    }
}
