/*!
 * Tests for configuration loading and validation
 */

use std::str::FromStr;

use storycast::app_config::{Config, LogLevel, NarrationProvider, SelectionMode};

/// Test the default configuration is sensible and valid
#[test]
fn test_config_default_shouldBeValid() {
    let config = Config::default();
    assert_eq!(config.narration.provider, NarrationProvider::StreamElements);
    assert_eq!(config.selection.mode, SelectionMode::Story);
    assert_eq!(config.segmenter.narration_char_limit, 250);
    assert_eq!(config.segmenter.caption_word_limit, 3);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test loading a missing file falls back to defaults
#[test]
fn test_config_from_file_withMissingFile_shouldUseDefaults() {
    let config = Config::from_file("no-such-config.json").expect("should fall back");
    assert_eq!(config.source.subreddit, Config::default().source.subreddit);
}

/// Test default file creation round-trips through from_file
#[test]
fn test_config_create_default_file_shouldRoundTrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("conf.json");

    Config::create_default_file(&path).expect("write default config");
    let loaded = Config::from_file(&path).expect("load default config");

    assert_eq!(loaded.narration.provider, NarrationProvider::StreamElements);
    assert_eq!(loaded.segmenter.caption_word_limit, 3);
    assert!(loaded.validate().is_ok());
}

/// Test partial config files fill the rest with defaults
#[test]
fn test_config_from_file_withPartialFile_shouldFillDefaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{"selection": {"mode": "comment", "min_replies": 3}}"#,
    )
    .expect("write");

    let loaded = Config::from_file(&path).expect("load partial config");
    assert_eq!(loaded.selection.mode, SelectionMode::Comment);
    assert_eq!(loaded.selection.min_replies, 3);
    // Untouched sections keep their defaults
    assert_eq!(loaded.segmenter.narration_char_limit, 250);
    assert_eq!(loaded.source.endpoint, "https://www.reddit.com");
}

/// Test a malformed config file is an error, not a silent default
#[test]
fn test_config_from_file_withMalformedFile_shouldFail() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ nope").expect("write");
    assert!(Config::from_file(&path).is_err());
}

/// Test validation rejects inconsistent settings
#[test]
fn test_config_validate_withBadSettings_shouldFail() {
    let mut config = Config::default();
    config.selection.min_text_length = 500;
    config.selection.max_text_length = 100;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.narration.provider = NarrationProvider::Piper;
    config.narration.model_path = String::new();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.narration.concurrent_renders = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.source.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.source.subreddit = "  ".to_string();
    assert!(config.validate().is_err());
}

/// Test the mock provider validates without network settings
#[test]
fn test_config_validate_withMockProvider_shouldIgnoreEndpoints() {
    let mut config = Config::default();
    config.narration.provider = NarrationProvider::Mock;
    config.narration.endpoint = String::new();
    assert!(config.validate().is_ok());
}

/// Test provider parsing and display round-trip
#[test]
fn test_narration_provider_fromStr_shouldRoundTrip() {
    for provider in [
        NarrationProvider::StreamElements,
        NarrationProvider::Piper,
        NarrationProvider::Mock,
    ] {
        let parsed = NarrationProvider::from_str(&provider.to_string()).expect("parse");
        assert_eq!(parsed, provider);
    }
    assert!(NarrationProvider::from_str("polly").is_err());
    assert_eq!(
        NarrationProvider::from_str("STREAMELEMENTS").expect("case-insensitive"),
        NarrationProvider::StreamElements
    );
}

/// Test storage paths derive from the configured data directory
#[test]
fn test_storage_paths_withExplicitDataDir_shouldDeriveFromIt() {
    let mut config = Config::default();
    config.storage.data_dir = "/tmp/storycast-test".to_string();

    assert_eq!(
        config.storage.dedup_ledger_path(),
        std::path::PathBuf::from("/tmp/storycast-test/used_units.json")
    );
    assert_eq!(
        config.storage.produced_ledger_path(),
        std::path::PathBuf::from("/tmp/storycast-test/produced.json")
    );
    assert_eq!(
        config.storage.temp_root(),
        std::path::PathBuf::from("/tmp/storycast-test/tmp")
    );
}

/// Test log level maps onto the log crate's filters
#[test]
fn test_log_level_toLevelFilter_shouldMapAll() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Info.to_level_filter(), log::LevelFilter::Info);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
