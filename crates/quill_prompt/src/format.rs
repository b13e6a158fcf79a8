//! Metadata formatting.

use crate::dynamic::evaluate_with;
use quill_core::{DialogueLevel, FieldValue, IdeaField, Mode, StoryMetadata};
use rand::Rng;

/// Format `metadata` into labelled `# <label>:\n<value>` blocks.
///
/// Fields follow [`IdeaField::ORDER`], with the dialogue level appended in
/// non-idea modes. Empty fields are omitted and blocks are separated by a blank
/// line. Free text is emitted as given (callers evaluate it beforehand); each
/// tag is evaluated here and loses any outer double-quote pair.
///
/// # Examples
///
/// ```
/// use quill_core::{Mode, StoryMetadataBuilder};
/// use quill_prompt::format_metadata;
///
/// let metadata = StoryMetadataBuilder::default()
///     .title("T")
///     .keywords(vec!["k1".to_string(), "k2".to_string()])
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     format_metadata(&metadata, &Mode::Generate),
///     "# タイトル:\nT\n\n# キーワード:\nk1\nk2"
/// );
/// ```
pub fn format_metadata(metadata: &StoryMetadata, mode: &Mode) -> String {
    format_metadata_with(metadata, mode, &mut rand::thread_rng())
}

/// [`format_metadata`] with a caller-supplied RNG.
pub fn format_metadata_with<R: Rng + ?Sized>(
    metadata: &StoryMetadata,
    mode: &Mode,
    rng: &mut R,
) -> String {
    let mut blocks: Vec<String> = IdeaField::ORDER
        .iter()
        .filter_map(|field| field_block(metadata, *field, &mut *rng))
        .collect();

    if !mode.is_idea() {
        if let Some(level) = metadata.dialogue_level() {
            blocks.push(format!("# {}:\n{}", DialogueLevel::HEADER_LABEL, level.label()));
        }
    }

    blocks.join("\n\n")
}

/// Resolve every dynamic prompt expression in `metadata` once.
///
/// Free text and tags are evaluated, and tags lose any outer double-quote
/// pair. Tags that resolve to nothing are dropped. The base prompt and a fast-mode suffix built from the same snapshot
/// show the same choices.
pub fn evaluate_metadata_with<R: Rng + ?Sized>(
    metadata: &StoryMetadata,
    rng: &mut R,
) -> StoryMetadata {
    let mut evaluated = metadata.clone();
    for field in IdeaField::ORDER {
        let value = if field.is_tag_field() {
            FieldValue::Tags(
                metadata
                    .tags(field)
                    .iter()
                    .map(|tag| strip_double_quotes(&evaluate_with(tag, &mut *rng)).to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect(),
            )
        } else {
            FieldValue::Text(evaluate_with(metadata.text(field), &mut *rng))
        };
        evaluated.set_field(field, value);
    }
    evaluated
}

/// One `# <label>:\n<value>` block, or `None` when the field has no content.
pub(crate) fn field_block<R: Rng + ?Sized>(
    metadata: &StoryMetadata,
    field: IdeaField,
    rng: &mut R,
) -> Option<String> {
    let value = if field.is_tag_field() {
        let tags: Vec<String> = metadata
            .tags(field)
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(|tag| strip_double_quotes(&evaluate_with(tag, &mut *rng)).to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        tags.join("\n")
    } else {
        metadata.text(field).trim().to_string()
    };

    if value.trim().is_empty() {
        None
    } else {
        Some(format!("{}\n{}", field.header(), value))
    }
}

fn strip_double_quotes(tag: &str) -> &str {
    let trimmed = tag.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::StoryMetadataBuilder;

    #[test]
    fn empty_metadata_formats_to_nothing() {
        assert_eq!(format_metadata(&StoryMetadata::default(), &Mode::Generate), "");
        assert_eq!(format_metadata(&StoryMetadata::default(), &Mode::Idea), "");
    }

    #[test]
    fn dialogue_level_skipped_in_idea_mode() {
        let metadata = StoryMetadataBuilder::default()
            .plot("p")
            .dialogue_level(DialogueLevel::Normal)
            .build()
            .unwrap();
        assert_eq!(
            format_metadata(&metadata, &Mode::Generate),
            "# プロット:\np\n\n# セリフ量:\n普通"
        );
        assert_eq!(format_metadata(&metadata, &Mode::Idea), "# プロット:\np");
    }

    #[test]
    fn tags_lose_outer_double_quotes() {
        let metadata = StoryMetadataBuilder::default()
            .genres(vec!["\"SF\"".to_string(), " ".to_string(), "学園".to_string()])
            .build()
            .unwrap();
        assert_eq!(format_metadata(&metadata, &Mode::Generate), "# ジャンル:\nSF\n学園");
    }

    #[test]
    fn evaluated_snapshot_has_no_expressions_left() {
        use rand::SeedableRng;

        let metadata = StoryMetadataBuilder::default()
            .title("{A|B}")
            .keywords(vec!["{\"x y\"|\"x y\"}".to_string()])
            .build()
            .unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        let evaluated = evaluate_metadata_with(&metadata, &mut rng);
        assert!(evaluated.title() == "A" || evaluated.title() == "B");
        assert_eq!(evaluated.keywords(), &vec!["x y".to_string()]);
    }

    #[test]
    fn tags_resolving_to_nothing_leave_no_blank_line() {
        let metadata = StoryMetadataBuilder::default()
            .keywords(vec!["a".to_string(), r#"{""}"#.to_string(), "b".to_string()])
            .build()
            .unwrap();
        assert_eq!(format_metadata(&metadata, &Mode::Generate), "# キーワード:\na\nb");

        let only_empty = StoryMetadataBuilder::default()
            .keywords(vec![r#"{""}"#.to_string()])
            .build()
            .unwrap();
        assert_eq!(format_metadata(&only_empty, &Mode::Generate), "");
        let evaluated = evaluate_metadata_with(&only_empty, &mut rand::thread_rng());
        assert!(evaluated.keywords().is_empty());
    }

    #[test]
    fn order_follows_idea_field_order() {
        let metadata = StoryMetadataBuilder::default()
            .plot("p")
            .title("t")
            .setting("s")
            .build()
            .unwrap();
        assert_eq!(
            format_metadata(&metadata, &Mode::Generate),
            "# タイトル:\nt\n\n# 設定:\ns\n\n# プロット:\np"
        );
    }
}
