/*!
 * Tests for configuration loading, validation and serialization
 */

use anyhow::Result;
use docxlate::app_config::{Config, LogLevel, TranslationProvider};
use docxlate::translation::{ConcurrencyMode, ReplacementPolicy};

use crate::common;

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefault() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.target_language, "hi");

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.engine, config.engine);
    Ok(())
}

#[test]
fn test_jsonRoundTrip_shouldKeepEngineSettings() -> Result<()> {
    let mut config = Config::default();
    config.engine.policy = ReplacementPolicy::WholeUnit;
    config.engine.mode = ConcurrencyMode::WorkerPool;
    config.engine.pool_size = Some(6);
    config.translation.provider = TranslationProvider::LibreTranslate;
    config.log_level = LogLevel::Debug;

    let json = serde_json::to_string_pretty(&config)?;
    assert!(json.contains("\"whole_unit\""));
    assert!(json.contains("\"worker_pool\""));
    assert!(json.contains("\"libretranslate\""));

    let parsed: Config = serde_json::from_str(&json)?;
    assert_eq!(parsed.engine, config.engine);
    assert_eq!(parsed.translation.provider, TranslationProvider::LibreTranslate);
    assert_eq!(parsed.log_level, LogLevel::Debug);
    Ok(())
}

#[test]
fn test_partialJson_shouldFillDefaults() -> Result<()> {
    let config: Config = serde_json::from_str(r#"{ "target_language": "ta", "engine": { "mode": "region_batched" } }"#)?;
    assert_eq!(config.source_language, "en");
    assert_eq!(config.engine.mode, ConcurrencyMode::RegionBatched);
    assert_eq!(config.engine.policy, ReplacementPolicy::PerRun);
    assert_eq!(config.engine.timeout_secs, 30);
    assert!(config.engine.cache_enabled);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_validate_withAutoSource_shouldSucceed() {
    let config = Config {
        source_language: "auto".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_ok());
    assert!(config.source().unwrap().is_auto());
}

#[test]
fn test_validate_withZeroTimeout_shouldFail() {
    let mut config = Config::default();
    config.engine.timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withTargetName_shouldResolveCode() {
    let config = Config {
        target_language: "Malayalam".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_ok());
    assert_eq!(config.target().unwrap().code(), "ml");
}

#[test]
fn test_rateLimit_forLibreTranslate_shouldDefaultTo30() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::LibreTranslate;
    assert_eq!(config.translation.get_rate_limit(), Some(30));
    config.translation.provider = TranslationProvider::Google;
    assert_eq!(config.translation.get_rate_limit(), None);
}
