//! Per-request generation context.

use crate::{ContinuationOrder, Mode, Rating, StoryMetadata};
use serde::{Deserialize, Serialize};

/// Everything prompt assembly needs for one generation request.
///
/// Built fresh per request. The CLI also reads it from TOML:
///
/// ```toml
/// mode = "generate"
/// body_text = ""
/// rating = "general"
///
/// [metadata]
/// title = "星降る夜の冒険"
/// keywords = ["魔法", "旅"]
/// ```
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct GenerationContext {
    /// Active mode
    mode: Mode,
    /// Story so far, possibly empty
    body_text: String,
    /// Structured attributes
    metadata: StoryMetadata,
    /// Rating; `None` falls back to the configured default
    rating: Option<Rating>,
    /// Author's note, only used by continuation tasks
    authors_note: String,
    /// Head/reference ordering; `None` falls back to the configured default
    continuation_order: Option<ContinuationOrder>,
}

impl GenerationContext {
    /// Rating to annotate, falling back to `default`.
    pub fn effective_rating(&self, default: Rating) -> Rating {
        self.rating.unwrap_or(default)
    }

    /// Continuation ordering, falling back to `default`.
    pub fn effective_continuation_order(&self, default: ContinuationOrder) -> ContinuationOrder {
        self.continuation_order.unwrap_or(default)
    }

    /// Switch the active mode.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Replace the body text.
    pub fn set_body_text(&mut self, body_text: impl Into<String>) {
        self.body_text = body_text.into();
    }

    /// Mutable access to the metadata.
    pub fn metadata_mut(&mut self) -> &mut StoryMetadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_falls_back_to_default() {
        let context = GenerationContext::default();
        assert_eq!(context.effective_rating(Rating::R18), Rating::R18);

        let context = GenerationContextBuilder::default()
            .rating(Rating::General)
            .build()
            .unwrap();
        assert_eq!(context.effective_rating(Rating::R18), Rating::General);
    }

    #[test]
    fn continuation_order_from_toml_or_default() {
        let context: GenerationContext = toml::from_str("body_text = \"x\"").unwrap();
        assert_eq!(
            context.effective_continuation_order(ContinuationOrder::TextFirst),
            ContinuationOrder::TextFirst
        );

        let context: GenerationContext =
            toml::from_str("continuation_order = \"reference_first\"").unwrap();
        assert_eq!(
            context.effective_continuation_order(ContinuationOrder::TextFirst),
            ContinuationOrder::ReferenceFirst
        );
    }
}
