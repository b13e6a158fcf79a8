//! Idea fields and their fixed order.
//!
//! The `# <label>:` header produced here is a de facto wire protocol: the model
//! was trained to emit it, and output filtering matches it byte for byte.

use quill_error::{PromptError, PromptErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;

/// One of the six structured story-attribute slots.
///
/// # Examples
///
/// ```
/// use quill_core::IdeaField;
///
/// assert_eq!(IdeaField::Synopsis.header(), "# あらすじ:");
/// assert_eq!(IdeaField::Title.next(), Some(IdeaField::Keywords));
/// assert_eq!(IdeaField::Plot.next(), None);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IdeaField {
    /// Single-line title
    Title,
    /// Short keyword tags
    Keywords,
    /// Genre tags
    Genres,
    /// Multi-line synopsis
    Synopsis,
    /// World and character setting
    Setting,
    /// Plot outline
    Plot,
}

impl IdeaField {
    /// The immutable idea field order.
    pub const ORDER: [IdeaField; 6] = [
        IdeaField::Title,
        IdeaField::Keywords,
        IdeaField::Genres,
        IdeaField::Synopsis,
        IdeaField::Setting,
        IdeaField::Plot,
    ];

    /// Localized label used in `# <label>:` headers.
    pub fn label(self) -> &'static str {
        match self {
            IdeaField::Title => "タイトル",
            IdeaField::Keywords => "キーワード",
            IdeaField::Genres => "ジャンル",
            IdeaField::Synopsis => "あらすじ",
            IdeaField::Setting => "設定",
            IdeaField::Plot => "プロット",
        }
    }

    /// Section header text, e.g. `"# タイトル:"`.
    pub fn header(self) -> String {
        format!("# {}:", self.label())
    }

    /// Internal key, e.g. `"synopsis"`.
    pub fn key(self) -> &'static str {
        match self {
            IdeaField::Title => "title",
            IdeaField::Keywords => "keywords",
            IdeaField::Genres => "genres",
            IdeaField::Synopsis => "synopsis",
            IdeaField::Setting => "setting",
            IdeaField::Plot => "plot",
        }
    }

    /// Position in [`IdeaField::ORDER`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The field that follows this one, if any.
    pub fn next(self) -> Option<IdeaField> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    /// Fields preceding this one, in order.
    pub fn predecessors(self) -> &'static [IdeaField] {
        &Self::ORDER[..self.index()]
    }

    /// Fields following this one, in order.
    pub fn successors(self) -> &'static [IdeaField] {
        &Self::ORDER[self.index() + 1..]
    }

    /// Whether this field holds a tag set rather than free text.
    pub fn is_tag_field(self) -> bool {
        matches!(self, IdeaField::Keywords | IdeaField::Genres)
    }

    /// Whether this is the last field in the order.
    pub fn is_last(self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for IdeaField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IdeaField {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        IdeaField::iter()
            .find(|field| field.as_ref() == needle.to_lowercase() || field.label() == needle)
            .ok_or_else(|| PromptError::new(PromptErrorKind::UnknownField(s.to_string())))
    }
}

/// Target of an idea generation: every field, or one specific field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IdeaSelection {
    /// Let the model produce the whole idea
    #[default]
    All,
    /// A single field
    Field(IdeaField),
}

impl IdeaSelection {
    /// The selected field, or `None` for [`IdeaSelection::All`].
    pub fn field(self) -> Option<IdeaField> {
        match self {
            IdeaSelection::All => None,
            IdeaSelection::Field(field) => Some(field),
        }
    }
}

impl From<IdeaField> for IdeaSelection {
    fn from(field: IdeaField) -> Self {
        IdeaSelection::Field(field)
    }
}

impl std::fmt::Display for IdeaSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdeaSelection::All => f.write_str("全部"),
            IdeaSelection::Field(field) => write!(f, "{}", field),
        }
    }
}

impl FromStr for IdeaSelection {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" | "全部" => Ok(IdeaSelection::All),
            other => other
                .parse::<IdeaField>()
                .map(IdeaSelection::Field)
                .map_err(|_| PromptError::new(PromptErrorKind::UnknownSelection(s.to_string()))),
        }
    }
}

impl TryFrom<String> for IdeaSelection {
    type Error = PromptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IdeaSelection> for String {
    fn from(selection: IdeaSelection) -> Self {
        match selection {
            IdeaSelection::All => "all".to_string(),
            IdeaSelection::Field(field) => field.key().to_string(),
        }
    }
}

/// A value destined for one idea field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::From)]
pub enum FieldValue {
    /// Free text (title, synopsis, setting, plot)
    Text(String),
    /// Tag set (keywords, genres)
    Tags(Vec<String>),
}

impl FieldValue {
    /// Whether the value has content after trimming.
    pub fn has_content(&self) -> bool {
        match self {
            FieldValue::Text(text) => !text.trim().is_empty(),
            FieldValue::Tags(tags) => tags.iter().any(|tag| !tag.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_matches_discriminants() {
        for (i, field) in IdeaField::ORDER.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
        assert_eq!(IdeaField::iter().collect::<Vec<_>>(), IdeaField::ORDER.to_vec());
    }

    #[test]
    fn predecessors_and_successors_partition_the_order() {
        let field = IdeaField::Synopsis;
        assert_eq!(
            field.predecessors(),
            &[IdeaField::Title, IdeaField::Keywords, IdeaField::Genres]
        );
        assert_eq!(field.successors(), &[IdeaField::Setting, IdeaField::Plot]);
        assert!(IdeaField::Title.predecessors().is_empty());
        assert!(IdeaField::Plot.successors().is_empty());
    }

    #[test]
    fn parses_keys_and_labels() {
        assert_eq!("genres".parse::<IdeaField>().unwrap(), IdeaField::Genres);
        assert_eq!("Plot".parse::<IdeaField>().unwrap(), IdeaField::Plot);
        assert_eq!("設定".parse::<IdeaField>().unwrap(), IdeaField::Setting);
        assert!("mood".parse::<IdeaField>().is_err());
    }

    #[test]
    fn parses_selection() {
        assert_eq!("all".parse::<IdeaSelection>().unwrap(), IdeaSelection::All);
        assert_eq!(
            "title".parse::<IdeaSelection>().unwrap(),
            IdeaSelection::Field(IdeaField::Title)
        );
        assert!("everything".parse::<IdeaSelection>().is_err());
    }

    #[test]
    fn tag_values_need_a_non_blank_member() {
        assert!(!FieldValue::Tags(vec![" ".into()]).has_content());
        assert!(FieldValue::Tags(vec!["魔法".into()]).has_content());
        assert!(!FieldValue::Text("\n".into()).has_content());
    }
}
