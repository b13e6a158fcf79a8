//! Settings store.
//!
//! Settings are layered with the `config` crate:
//! - Bundled defaults (include_str! from quill.toml)
//! - User overrides (~/.config/quill/quill.toml, then ./quill.toml)
//!
//! Later sources take precedence. A legacy single `max_length` key is migrated
//! to both per-mode limits when neither per-mode key is present.

use crate::{ContinuationOrder, Mode, Rating};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use quill_error::{ConfigError, IoError, QuillError, QuillErrorKind, QuillResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../quill.toml");

const DEFAULT_MAX_LENGTH_IDEA: u32 = 500;
const DEFAULT_MAX_LENGTH_GENERATE: u32 = 250;

/// Which backend client to construct.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// KoboldCpp streaming API
    #[default]
    #[display("kobold")]
    Kobold,
    /// OpenAI-compatible completions API (LM Studio, llama.cpp server, ...)
    #[display("openai_compatible")]
    OpenaiCompatible,
}

/// What the repeated-generation loop does between cycles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum InfiniteBehavior {
    /// Reuse the prompt prepared for the first cycle
    #[default]
    #[display("manual")]
    Manual,
    /// Rebuild the prompt for every cycle
    #[display("immediate")]
    Immediate,
}

/// Per-mode [`InfiniteBehavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InfiniteGenerationBehavior {
    /// Idea mode behaviour
    pub idea: InfiniteBehavior,
    /// Generate mode behaviour
    pub generate: InfiniteBehavior,
}

impl InfiniteGenerationBehavior {
    /// Behaviour for `mode`; unknown modes use the generate setting.
    pub fn for_mode(&self, mode: &Mode) -> InfiniteBehavior {
        if mode.is_idea() {
            self.idea
        } else {
            self.generate
        }
    }
}

/// Where transferred output is inserted into the body text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// At the cursor
    #[default]
    #[display("cursor")]
    Cursor,
    /// On a fresh line after the cursor's line
    #[display("next_line_always")]
    NextLineAlways,
    /// On a fresh line only when the cursor sits at end of line
    #[display("next_line_eol")]
    NextLineEol,
}

/// Flat settings store.
///
/// # Example
///
/// ```toml
/// client_type = "openai_compatible"
/// base_url = "127.0.0.1:1234"
/// max_length_generate = 400
///
/// [infinite_generation_behavior]
/// generate = "immediate"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend flavour
    pub client_type: ClientType,
    /// Server address, with or without scheme
    pub base_url: String,
    /// Token budget for idea mode
    pub max_length_idea: u32,
    /// Token budget for generate mode
    pub max_length_generate: u32,
    /// Sampling temperature
    pub temperature: f64,
    /// Min-p sampling
    pub min_p: f64,
    /// Top-p sampling
    pub top_p: f64,
    /// Top-k sampling, 0 disables
    pub top_k: u32,
    /// Repetition penalty
    pub rep_pen: f64,
    /// Default stop sequences
    pub stop_sequences: Vec<String>,
    /// Repeated generation behaviour per mode
    pub infinite_generation_behavior: InfiniteGenerationBehavior,
    /// Output transfer placement
    pub transfer_to_main_mode: TransferMode,
    /// Blank lines inserted before next-line transfers
    pub transfer_newlines_before: u32,
    /// Continuation prompt ordering
    pub cont_prompt_order: ContinuationOrder,
    /// Rating used when a request does not carry one
    pub default_rating: Rating,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_type: ClientType::Kobold,
            base_url: "127.0.0.1:5001".to_string(),
            max_length_idea: DEFAULT_MAX_LENGTH_IDEA,
            max_length_generate: DEFAULT_MAX_LENGTH_GENERATE,
            temperature: 0.15,
            min_p: 0.1,
            top_p: 0.95,
            top_k: 0,
            rep_pen: 1.0,
            stop_sequences: vec!["[INST]".to_string(), "[/INST]".to_string()],
            infinite_generation_behavior: InfiniteGenerationBehavior::default(),
            transfer_to_main_mode: TransferMode::Cursor,
            transfer_newlines_before: 0,
            cont_prompt_order: ContinuationOrder::ReferenceFirst,
            default_rating: Rating::General,
        }
    }
}

impl Settings {
    /// Load settings with precedence: current dir > home dir > bundled defaults.
    ///
    /// User files are optional and silently skipped when absent.
    ///
    /// ```no_run
    /// use quill_core::Settings;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let settings = Settings::load()?;
    /// println!("{}", settings.base_url);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load() -> QuillResult<Self> {
        debug!("Loading settings with precedence: current dir > home dir > bundled defaults");

        let mut builder = Self::defaults_builder();

        if let Some(home_config) = Self::user_config_path() {
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("quill").required(false));

        Self::resolve(builder)
    }

    /// Per-user settings file, `~/.config/quill/quill.toml`.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/quill/quill.toml"))
    }

    /// Load a specific settings file on top of the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed. Configuration
    /// errors name `path`.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> QuillResult<Self> {
        debug!("Loading settings from file");

        let path = path.as_ref();
        let builder = Self::defaults_builder().add_source(File::from(path).format(FileFormat::Toml));

        Self::resolve(builder).map_err(|e| {
            if let QuillErrorKind::Config(config) = e.kind() {
                return config.clone().with_source_file(path).into();
            }
            e
        })
    }

    /// Parse settings from a TOML string on top of the bundled defaults.
    pub fn from_toml_str(toml: &str) -> QuillResult<Self> {
        Self::resolve(Self::defaults_builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    /// Write the settings as pretty TOML, creating parent directories.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> QuillResult<()> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to serialize settings: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                IoError::new(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        std::fs::write(path, text)
            .map_err(|e| IoError::new(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Settings saved");
        Ok(())
    }

    /// Token budget for `mode`. Unknown modes use the generate budget.
    pub fn max_length(&self, mode: &Mode) -> u32 {
        if mode.is_idea() {
            self.max_length_idea
        } else {
            self.max_length_generate
        }
    }

    /// Base URL with an `http://` scheme when none was given, without trailing slash.
    pub fn base_url_with_scheme(&self) -> String {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        }
    }

    fn defaults_builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn resolve(builder: ConfigBuilder<DefaultState>) -> QuillResult<Self> {
        let config = builder.build().map_err(|e| {
            QuillError::from(ConfigError::new(format!("Failed to build configuration: {}", e)))
        })?;

        let legacy = config.get::<u32>("max_length").ok();
        let has_per_mode = config.get::<u32>("max_length_idea").is_ok()
            || config.get::<u32>("max_length_generate").is_ok();

        let mut settings: Settings = config.try_deserialize().map_err(|e| {
            QuillError::from(ConfigError::new(format!("Failed to parse configuration: {}", e)))
        })?;

        if let Some(max_length) = legacy {
            if !has_per_mode {
                info!(max_length, "Migrating legacy max_length to per-mode limits");
                settings.max_length_idea = max_length;
                settings.max_length_generate = max_length;
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_match_default_impl() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn base_url_gets_scheme() {
        let mut settings = Settings::default();
        assert_eq!(settings.base_url_with_scheme(), "http://127.0.0.1:5001");
        settings.base_url = "https://example.test/".into();
        assert_eq!(settings.base_url_with_scheme(), "https://example.test");
    }

    #[test]
    fn max_length_per_mode() {
        let settings = Settings::default();
        assert_eq!(settings.max_length(&Mode::Idea), 500);
        assert_eq!(settings.max_length(&Mode::Generate), 250);
        assert_eq!(settings.max_length(&Mode::Unknown("x".into())), 250);
    }
}
