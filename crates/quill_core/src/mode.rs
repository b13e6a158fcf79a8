//! Mode, rating, task and status enums.

use quill_error::PromptError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Active task mode chosen by the host.
///
/// Unrecognised mode names are kept as [`Mode::Unknown`] so classification can
/// fail soft instead of rejecting the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    /// Free-form generation or continuation
    #[default]
    Generate,
    /// Structured idea elicitation
    Idea,
    /// Anything else the host passed in
    Unknown(String),
}

impl Mode {
    /// Whether this is [`Mode::Idea`].
    pub fn is_idea(&self) -> bool {
        matches!(self, Mode::Idea)
    }
}

impl From<String> for Mode {
    fn from(value: String) -> Self {
        match value.trim() {
            "generate" => Mode::Generate,
            "idea" => Mode::Idea,
            _ => Mode::Unknown(value),
        }
    }
}

impl From<&str> for Mode {
    fn from(value: &str) -> Self {
        Mode::from(value.to_string())
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Generate => "generate".to_string(),
            Mode::Idea => "idea".to_string(),
            Mode::Unknown(other) => other,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Generate => f.write_str("generate"),
            Mode::Idea => f.write_str("idea"),
            Mode::Unknown(other) => f.write_str(other),
        }
    }
}

/// Content rating annotated onto every instruction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    /// All ages
    #[default]
    #[display("general")]
    General,
    /// Adult content
    #[serde(rename = "r18")]
    #[display("r18")]
    R18,
}

impl Rating {
    /// Localized annotation label.
    pub fn label(self) -> &'static str {
        match self {
            Rating::General => "全年齢",
            Rating::R18 => "R-18",
        }
    }
}

impl FromStr for Rating {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" | "全年齢" => Ok(Rating::General),
            "r18" | "r-18" => Ok(Rating::R18),
            _ => Err(PromptError::invalid_value("rating", s)),
        }
    }
}

/// Relative order of the body head and reference blocks in continuation prompts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationOrder {
    /// Head block, then reference block
    #[display("text_first")]
    TextFirst,
    /// Reference block, then head block
    #[default]
    #[display("reference_first")]
    ReferenceFirst,
}

impl FromStr for ContinuationOrder {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text_first" => Ok(ContinuationOrder::TextFirst),
            "reference_first" => Ok(ContinuationOrder::ReferenceFirst),
            _ => Err(PromptError::invalid_value("continuation_order", s)),
        }
    }
}

/// Idea generation strategy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStrategy {
    /// Generate everything, then extract the selected field
    #[default]
    #[display("safe")]
    Safe,
    /// Prime with preceding fields and stream only the selected one
    #[display("fast")]
    Fast,
}

impl FromStr for IdeaStrategy {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "safe" => Ok(IdeaStrategy::Safe),
            "fast" => Ok(IdeaStrategy::Fast),
            _ => Err(PromptError::invalid_value("strategy", s)),
        }
    }
}

/// The six prompt task variants.
///
/// Derived per request from mode, body text, and metadata; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Generate from scratch
    #[display("GEN_ZERO")]
    GenZero,
    /// Generate from metadata
    #[display("GEN_INFO")]
    GenInfo,
    /// Continue the body without metadata
    #[display("CONT_ZERO")]
    ContZero,
    /// Continue the body with metadata
    #[display("CONT_INFO")]
    ContInfo,
    /// Free idea
    #[display("IDEA_ZERO")]
    IdeaZero,
    /// Idea from metadata
    #[display("IDEA_INFO")]
    IdeaInfo,
}

impl TaskType {
    /// `GEN_ZERO` or `GEN_INFO`.
    pub fn is_generation(self) -> bool {
        matches!(self, TaskType::GenZero | TaskType::GenInfo)
    }

    /// `CONT_ZERO` or `CONT_INFO`.
    pub fn is_continuation(self) -> bool {
        matches!(self, TaskType::ContZero | TaskType::ContInfo)
    }

    /// `IDEA_ZERO` or `IDEA_INFO`.
    pub fn is_idea(self) -> bool {
        matches!(self, TaskType::IdeaZero | TaskType::IdeaInfo)
    }

    /// Localized instruction text for this task.
    pub fn instruction(self) -> &'static str {
        match self {
            TaskType::GenZero => "自由に小説を生成してください。",
            TaskType::GenInfo => "以下の情報に基づいて小説本文を生成してください。",
            TaskType::ContZero => "以下の文章の続きを生成してください。",
            TaskType::ContInfo => "参考情報を基に以下の文章の続きを生成してください。",
            TaskType::IdeaZero => {
                "自由に小説のアイデア（タイトル、キーワード、ジャンル、あらすじ、設定、プロット）を生成してください。"
            }
            TaskType::IdeaInfo => {
                "以下の情報に基づいて、完全な小説のアイデア（タイトル、キーワード、ジャンル、あらすじ、設定、プロット）を生成してください。"
            }
        }
    }
}

/// Host-owned generation status flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Nothing running
    #[default]
    #[display("idle")]
    Idle,
    /// One-shot generation in flight
    #[display("single_running")]
    SingleRunning,
    /// Repeated generation loop in flight
    #[display("infinite_running")]
    InfiniteRunning,
}

impl GenerationStatus {
    /// Whether any generation is in flight.
    pub fn is_running(self) -> bool {
        !matches!(self, GenerationStatus::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_unknown_names() {
        assert_eq!(Mode::from("idea"), Mode::Idea);
        let odd = Mode::from("poem");
        assert_eq!(odd, Mode::Unknown("poem".into()));
        assert_eq!(String::from(odd), "poem");
    }

    #[test]
    fn task_type_display_uses_tags() {
        assert_eq!(TaskType::ContInfo.to_string(), "CONT_INFO");
        assert!(TaskType::ContInfo.is_continuation());
        assert!(!TaskType::ContInfo.is_idea());
    }

    #[test]
    fn rating_parses_both_spellings() {
        assert_eq!("R-18".parse::<Rating>().unwrap(), Rating::R18);
        assert_eq!("general".parse::<Rating>().unwrap(), Rating::General);
        assert!("pg13".parse::<Rating>().is_err());
    }

    #[test]
    fn continuation_order_defaults_to_reference_first() {
        assert_eq!(ContinuationOrder::default(), ContinuationOrder::ReferenceFirst);
    }
}
