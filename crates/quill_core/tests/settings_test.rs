//! Tests for the settings store.

use quill_core::{ClientType, ContinuationOrder, InfiniteBehavior, Mode, Rating, Settings, TransferMode};
use quill_error::QuillErrorKind;
use std::io::Write;
use tempfile::Builder;

#[test]
fn test_bundled_defaults() {
    let settings = Settings::from_toml_str("").unwrap();

    assert_eq!(settings.client_type, ClientType::Kobold);
    assert_eq!(settings.base_url, "127.0.0.1:5001");
    assert_eq!(settings.max_length_idea, 500);
    assert_eq!(settings.max_length_generate, 250);
    assert_eq!(settings.top_k, 0);
    assert_eq!(settings.stop_sequences, vec!["[INST]", "[/INST]"]);
    assert_eq!(settings.transfer_to_main_mode, TransferMode::Cursor);
    assert_eq!(settings.cont_prompt_order, ContinuationOrder::ReferenceFirst);
    assert_eq!(settings.default_rating, Rating::General);
    assert_eq!(settings.infinite_generation_behavior.idea, InfiniteBehavior::Manual);
}

#[test]
fn test_settings_from_file_overrides_defaults() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
client_type = "openai_compatible"
base_url = "localhost:1234"
max_length_generate = 400
default_rating = "r18"

[infinite_generation_behavior]
generate = "immediate"
"#
    )
    .unwrap();

    let settings = Settings::from_file(temp_file.path()).unwrap();

    assert_eq!(settings.client_type, ClientType::OpenaiCompatible);
    assert_eq!(settings.base_url_with_scheme(), "http://localhost:1234");
    assert_eq!(settings.max_length_generate, 400);
    // Untouched keys keep their defaults
    assert_eq!(settings.max_length_idea, 500);
    assert_eq!(settings.default_rating, Rating::R18);
    assert_eq!(
        settings.infinite_generation_behavior.for_mode(&Mode::Generate),
        InfiniteBehavior::Immediate
    );
    assert_eq!(
        settings.infinite_generation_behavior.for_mode(&Mode::Idea),
        InfiniteBehavior::Manual
    );
}

#[test]
fn test_legacy_max_length_migrates_to_both_modes() {
    let settings = Settings::from_toml_str("max_length = 320").unwrap();
    assert_eq!(settings.max_length_idea, 320);
    assert_eq!(settings.max_length_generate, 320);
}

#[test]
fn test_legacy_max_length_ignored_when_per_mode_present() {
    let settings = Settings::from_toml_str("max_length = 320\nmax_length_idea = 700").unwrap();
    assert_eq!(settings.max_length_idea, 700);
    assert_eq!(settings.max_length_generate, 250);
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/quill.toml");

    let mut settings = Settings::default();
    settings.temperature = 0.7;
    settings.stop_sequences.push("# End".to_string());
    settings.transfer_to_main_mode = TransferMode::NextLineEol;
    settings.save(&path).unwrap();

    let reloaded = Settings::from_file(&path).unwrap();
    assert_eq!(reloaded, settings);
}

#[test]
fn test_invalid_value_is_config_error() {
    let err = Settings::from_toml_str("client_type = \"ollama\"").unwrap_err();
    assert!(format!("{}", err).contains("Configuration Error"));
}

#[test]
fn test_invalid_file_names_the_file() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(temp_file, "client_type = \"ollama\"").unwrap();

    let err = Settings::from_file(temp_file.path()).unwrap_err();
    match err.kind() {
        QuillErrorKind::Config(config) => {
            assert_eq!(config.source_file.as_deref(), Some(temp_file.path()));
        }
        other => panic!("expected a configuration error, got {other}"),
    }
    assert!(err.to_string().contains("(reading "));
}
