//! Story metadata record.

use crate::{FieldValue, IdeaField};
use quill_error::PromptError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How much dialogue the generated prose should contain.
///
/// Unspecified ("指定なし") is represented by `None` on [`StoryMetadata`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum DialogueLevel {
    /// 少ない
    Few,
    /// やや少ない
    SomewhatFew,
    /// 普通
    Normal,
    /// やや多い
    SomewhatMany,
    /// 多い
    Many,
}

impl DialogueLevel {
    /// Label emitted in prompts under the `# セリフ量:` header.
    pub fn label(self) -> &'static str {
        match self {
            DialogueLevel::Few => "少ない",
            DialogueLevel::SomewhatFew => "やや少ない",
            DialogueLevel::Normal => "普通",
            DialogueLevel::SomewhatMany => "やや多い",
            DialogueLevel::Many => "多い",
        }
    }

    fn key(self) -> &'static str {
        match self {
            DialogueLevel::Few => "few",
            DialogueLevel::SomewhatFew => "somewhat_few",
            DialogueLevel::Normal => "normal",
            DialogueLevel::SomewhatMany => "somewhat_many",
            DialogueLevel::Many => "many",
        }
    }

    /// Header label for the dialogue-level block.
    pub const HEADER_LABEL: &'static str = "セリフ量";

    /// Label users pick for "no preference".
    pub const UNSPECIFIED_LABEL: &'static str = "指定なし";

    /// Parse a user-facing choice where "指定なし" (or "unspecified") means `None`.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, PromptError> {
        match s.trim() {
            "" | Self::UNSPECIFIED_LABEL | "unspecified" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl std::fmt::Display for DialogueLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DialogueLevel {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use strum::IntoEnumIterator;

        let needle = s.trim();
        DialogueLevel::iter()
            .find(|level| level.label() == needle || level.key() == needle)
            .ok_or_else(|| PromptError::invalid_value("dialogue_level", s))
    }
}

/// User-authored structured story attributes.
///
/// Every field is independently optional. Strings "have content" when they are
/// non-empty after trimming; tag sets when at least one tag is non-blank.
///
/// # Examples
///
/// ```
/// use quill_core::{IdeaField, StoryMetadataBuilder};
///
/// let metadata = StoryMetadataBuilder::default()
///     .title("星降る夜の冒険")
///     .keywords(vec!["魔法".to_string()])
///     .build()
///     .unwrap();
///
/// assert!(metadata.has_content(IdeaField::Title));
/// assert!(!metadata.has_content(IdeaField::Plot));
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
pub struct StoryMetadata {
    /// Single-line title
    title: String,
    /// Keyword tags
    keywords: Vec<String>,
    /// Genre tags
    genres: Vec<String>,
    /// Synopsis
    synopsis: String,
    /// Setting
    setting: String,
    /// Plot outline
    plot: String,
    /// Dialogue amount, `None` when unspecified
    dialogue_level: Option<DialogueLevel>,
}

impl StoryMetadata {
    /// Whether the given idea field has content.
    pub fn has_content(&self, field: IdeaField) -> bool {
        if field.is_tag_field() {
            self.tags(field).iter().any(|tag| !tag.trim().is_empty())
        } else {
            !self.text(field).trim().is_empty()
        }
    }

    /// Whether any field has content.
    ///
    /// `include_dialogue` decides whether a set dialogue level counts, which
    /// differs between generate and idea modes.
    pub fn has_any_content(&self, include_dialogue: bool) -> bool {
        IdeaField::ORDER.iter().any(|field| self.has_content(*field))
            || (include_dialogue && self.dialogue_level.is_some())
    }

    /// Free text for `field`; empty for tag fields.
    pub fn text(&self, field: IdeaField) -> &str {
        match field {
            IdeaField::Title => &self.title,
            IdeaField::Synopsis => &self.synopsis,
            IdeaField::Setting => &self.setting,
            IdeaField::Plot => &self.plot,
            IdeaField::Keywords | IdeaField::Genres => "",
        }
    }

    /// Tags for `field`; empty for free-text fields.
    pub fn tags(&self, field: IdeaField) -> &[String] {
        match field {
            IdeaField::Keywords => &self.keywords,
            IdeaField::Genres => &self.genres,
            _ => &[],
        }
    }

    /// Current value of `field` as a [`FieldValue`].
    pub fn value(&self, field: IdeaField) -> FieldValue {
        if field.is_tag_field() {
            FieldValue::Tags(self.tags(field).to_vec())
        } else {
            FieldValue::Text(self.text(field).to_string())
        }
    }

    /// Overwrite `field` with `value`.
    ///
    /// Tags handed to a free-text field are joined with newlines; text handed
    /// to a tag field is split on whitespace. Blank tags are dropped and
    /// duplicates suppressed, keeping first occurrence.
    pub fn set_field(&mut self, field: IdeaField, value: FieldValue) {
        match field {
            IdeaField::Keywords | IdeaField::Genres => {
                let raw = match value {
                    FieldValue::Tags(tags) => tags,
                    FieldValue::Text(text) => {
                        text.split_whitespace().map(str::to_string).collect()
                    }
                };
                let mut tags: Vec<String> = Vec::with_capacity(raw.len());
                for tag in raw {
                    let tag = tag.trim();
                    if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                        tags.push(tag.to_string());
                    }
                }
                if field == IdeaField::Keywords {
                    self.keywords = tags;
                } else {
                    self.genres = tags;
                }
            }
            _ => {
                let text = match value {
                    FieldValue::Text(text) => text,
                    FieldValue::Tags(tags) => tags.join("\n"),
                };
                match field {
                    IdeaField::Title => self.title = text,
                    IdeaField::Synopsis => self.synopsis = text,
                    IdeaField::Setting => self.setting = text,
                    _ => self.plot = text,
                }
            }
        }
    }

    /// Set or clear the dialogue level.
    pub fn set_dialogue_level(&mut self, level: Option<DialogueLevel>) {
        self.dialogue_level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_is_empty() {
        let metadata = StoryMetadataBuilder::default()
            .title("   ")
            .genres(vec![String::new(), " ".to_string()])
            .build()
            .unwrap();
        assert!(!metadata.has_any_content(true));
    }

    #[test]
    fn dialogue_level_counts_only_when_included() {
        let metadata = StoryMetadataBuilder::default()
            .dialogue_level(DialogueLevel::Many)
            .build()
            .unwrap();
        assert!(metadata.has_any_content(true));
        assert!(!metadata.has_any_content(false));
    }

    #[test]
    fn set_field_normalizes_tags() {
        let mut metadata = StoryMetadata::default();
        metadata.set_field(
            IdeaField::Keywords,
            FieldValue::Tags(vec![" 魔法 ".into(), "".into(), "魔法".into(), "旅".into()]),
        );
        assert_eq!(metadata.keywords(), &vec!["魔法".to_string(), "旅".to_string()]);

        metadata.set_field(IdeaField::Genres, FieldValue::Text("SF  ミステリー".into()));
        assert_eq!(metadata.genres(), &vec!["SF".to_string(), "ミステリー".to_string()]);
    }

    #[test]
    fn set_field_joins_tags_for_text_fields() {
        let mut metadata = StoryMetadata::default();
        metadata.set_field(IdeaField::Plot, FieldValue::Tags(vec!["起".into(), "承".into()]));
        assert_eq!(metadata.plot(), "起\n承");
    }

    #[test]
    fn dialogue_level_parsing() {
        assert_eq!("やや多い".parse::<DialogueLevel>().unwrap(), DialogueLevel::SomewhatMany);
        assert_eq!("few".parse::<DialogueLevel>().unwrap(), DialogueLevel::Few);
        assert_eq!(DialogueLevel::parse_optional("指定なし").unwrap(), None);
        assert!("たくさん".parse::<DialogueLevel>().is_err());
    }
}
