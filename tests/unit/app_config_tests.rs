/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use xliffwai::app_config::{Config, LogLevel, ProviderConfig, TranslationProvider, XliffConfig};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert!(config.ignore_list.is_empty());
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.log_level, LogLevel::Info);

    let ollama_config = config.translation.get_provider_config(&TranslationProvider::Ollama)
        .expect("Ollama provider config should exist");
    assert_eq!(ollama_config.timeout_secs, 30);
    assert_eq!(ollama_config.endpoint, "http://localhost:11434");

    assert!(!config.xliff.keep_existing_targets);
    assert!(config.xliff.skip_empty_sources);
    assert_eq!(config.xliff.max_concurrent_requests, None);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en-US".to_string();
    assert!(config.validate().is_ok());

    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "pt_BR".to_string();
    assert!(config.validate().is_ok());

    config.xliff.max_concurrent_requests = Some(0);
    assert!(config.validate().is_err());
    config.xliff.max_concurrent_requests = Some(2);
    assert!(config.validate().is_ok());
}

/// Remote providers need an API key
#[test]
fn test_config_validation_withRemoteProviderAndKey_shouldPass() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    config.translation.active_provider_config_mut().api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());

    config.translation.provider = TranslationProvider::LMStudio;
    config.translation.active_provider_config_mut().api_key.clear();
    assert!(config.validate().is_ok());
}

/// Test provider string conversions
#[test]
fn test_translationProvider_conversions_shouldRoundTrip() {
    for provider in [
        TranslationProvider::Ollama,
        TranslationProvider::OpenAI,
        TranslationProvider::Anthropic,
        TranslationProvider::LMStudio,
    ] {
        let parsed: TranslationProvider = provider.to_string().parse().unwrap();
        assert_eq!(parsed, provider);
    }

    assert!("deepl".parse::<TranslationProvider>().is_err());
    assert_eq!(TranslationProvider::LMStudio.display_name(), "LM Studio");
}

/// Provider getters fall back to defaults when the entry is missing or blank
#[test]
fn test_translationConfig_getters_withMissingProviderEntry_shouldUseDefaults() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::LMStudio;
    config.translation.available_providers.clear();

    assert_eq!(config.translation.get_endpoint(), "http://localhost:1234/v1");
    assert_eq!(config.translation.get_model(), "local-model");
    assert_eq!(config.translation.get_timeout_secs(), 30);

    config.translation.available_providers.push(ProviderConfig {
        model: String::new(),
        endpoint: "http://gpu-box:1234/v1".to_string(),
        ..ProviderConfig::new(TranslationProvider::LMStudio)
    });
    assert_eq!(config.translation.get_endpoint(), "http://gpu-box:1234/v1");
    assert_eq!(config.translation.get_model(), "local-model");
}

/// Concurrency comes from the xliff override, then the provider entry, then the profile
#[test]
fn test_translateOptions_shouldResolveConcurrencyInOrder() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;
    assert_eq!(config.translate_options().max_concurrent_requests, 8);

    config.translation.active_provider_config_mut().concurrent_requests = 3;
    assert_eq!(config.translate_options().max_concurrent_requests, 3);

    config.xliff = XliffConfig {
        keep_existing_targets: true,
        skip_empty_sources: false,
        max_concurrent_requests: Some(1),
    };
    let options = config.translate_options();
    assert_eq!(options.max_concurrent_requests, 1);
    assert!(options.keep_existing_targets);
    assert!(!options.skip_empty_sources);
}

/// Config files may omit every optional section
#[test]
fn test_config_deserialize_withMinimalJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "source_language": "en",
        "target_language": "de",
        "translation": { "provider": "ollama" }
    }"#;
    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.target_language, "de");
    assert!(config.ignore_list.is_empty());
    assert!(config.xliff.skip_empty_sources);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.translation.common.retry_count, 3);
    assert!(config.translation.common.system_prompt.contains("{target_language}"));
    Ok(())
}

/// A missing config file is created with defaults, an existing one is read back
#[test]
fn test_loadOrCreate_shouldCreateThenReuseFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let (config, created) = Config::load_or_create(&path)?;
    assert!(created);
    assert!(path.exists());
    assert_eq!(config.target_language, "fr");

    let mut edited = config.clone();
    edited.target_language = "es".to_string();
    edited.ignore_list = vec!["app.title".to_string()];
    edited.save(&path)?;

    let (reloaded, created) = Config::load_or_create(&path)?;
    assert!(!created);
    assert_eq!(reloaded.target_language, "es");
    assert_eq!(reloaded.ignore_list, vec!["app.title".to_string()]);
    Ok(())
}

/// Broken JSON is reported with the file name
#[test]
fn test_fromFile_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    let error = Config::from_file(&path).unwrap_err();
    assert!(format!("{:#}", error).contains("conf.json"));
    Ok(())
}

#[test]
fn test_logLevel_toLevelFilter_shouldMatch() {
    assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
}
