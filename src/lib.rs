/*!
 * # xliffwai - XLIFF translation with AI
 *
 * A Rust library that fills in the `<target>` elements of XLIFF files using
 * AI translation providers, leaving the rest of the document untouched.
 *
 * ## Features
 *
 * - XLIFF 1.2 `trans-unit` and XLIFF 2.x `unit`/`segment` support
 * - Translate units using various AI providers:
 *   - Ollama (local LLM)
 *   - OpenAI API
 *   - Anthropic API
 *   - LM Studio (OpenAI-compatible local server)
 * - Ignore lists and `translate="no"` handling
 * - Inline placeholders (`<x/>`, `<ph>`, ...) copied verbatim into targets
 * - Bounded concurrent requests with an in-memory translation cache
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `xliff`: document model and the target merge engine
 *   - `xliff::document`: parsing, serialization and structural comparison
 *   - `xliff::merge`: unit discovery and target insertion
 * - `translation`: the `Translator` capability and its provider-backed service
 *   - `translation::core`: `TranslationService`
 *   - `translation::cache`: caching of finished translations
 *   - `translation::concurrency`: per-provider concurrency defaults
 * - `providers`: client implementations for various LLM providers
 * - `app_config`: configuration management
 * - `app_controller`: file and folder workflows
 * - `file_utils`: file system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;
pub mod xliff;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ProviderError, TranslationError, XliffError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use translation::{TranslationService, Translator};
pub use xliff::{translate, Document, MergeReport, TranslateOptions};
