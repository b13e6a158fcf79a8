//! Moving model output into the story.
//!
//! Two pure text operations back the host's transfer buttons: pulling one
//! field's value out of a selected idea response, and inserting output into
//! the body text according to the configured [`TransferMode`].

use quill_core::{FieldValue, IdeaField, TransferMode};
use tracing::debug;

/// Extract `field`'s value from a selection of model output.
///
/// The `# <label>:` header may appear anywhere in the selection. Lines are
/// taken until one starts with a different field's header. Titles keep their
/// first line; tag fields split on lines and drop `-` bullets.
///
/// # Examples
///
/// ```
/// use quill_core::{FieldValue, IdeaField};
/// use quill_prompt::extract_field_value;
///
/// let selection = "# キーワード:\n- 魔法\n- 星\n# ジャンル:\nファンタジー";
/// assert_eq!(
///     extract_field_value(selection, IdeaField::Keywords),
///     Some(FieldValue::Tags(vec!["魔法".into(), "星".into()]))
/// );
/// ```
pub fn extract_field_value(selection: &str, field: IdeaField) -> Option<FieldValue> {
    let header = field.header();
    let start = selection.find(&header)? + header.len();
    let after_header = selection[start..].trim();

    let others: Vec<String> = IdeaField::ORDER
        .iter()
        .filter(|other| **other != field)
        .map(|other| other.header())
        .collect();

    let value = after_header
        .lines()
        .take_while(|line| {
            let line = line.trim();
            !others.iter().any(|header| line.starts_with(header.as_str()))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    debug!(field = %field, len = value.len(), "Extracted field value");

    let extracted = match field {
        IdeaField::Title => FieldValue::Text(value.lines().next().unwrap_or_default().to_string()),
        IdeaField::Keywords | IdeaField::Genres => FieldValue::Tags(
            value
                .lines()
                .map(|line| line.trim().trim_start_matches('-').trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => FieldValue::Text(value),
    };
    Some(extracted)
}

/// Body text after a transfer, with the cursor placed after the insertion.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct Transfer {
    /// Updated body text
    text: String,
    /// Cursor position in chars
    cursor: usize,
}

impl Transfer {
    /// Consume and return the updated text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Insert `insertion` into `main_text` at a char-offset `cursor`.
///
/// Out-of-range cursors are clamped to the end of the text.
///
/// # Examples
///
/// ```
/// use quill_core::TransferMode;
/// use quill_prompt::transfer_to_main;
///
/// let out = transfer_to_main("ab\ncd", 1, "X", TransferMode::NextLineAlways, 1);
/// assert_eq!(out.text(), "ab\n\nX\ncd");
/// ```
pub fn transfer_to_main(
    main_text: &str,
    cursor: usize,
    insertion: &str,
    mode: TransferMode,
    newlines_before: u32,
) -> Transfer {
    let chars: Vec<char> = main_text.chars().collect();
    let cursor = cursor.min(chars.len());
    let line_end = chars[cursor..]
        .iter()
        .position(|c| *c == '\n')
        .map(|offset| cursor + offset)
        .unwrap_or(chars.len());

    let next_line = match mode {
        TransferMode::Cursor => false,
        TransferMode::NextLineAlways => true,
        TransferMode::NextLineEol => cursor == line_end,
    };

    let (at, inserted) = if next_line {
        let newlines = "\n".repeat(newlines_before as usize + 1);
        (line_end, format!("{}{}", newlines, insertion))
    } else {
        (cursor, insertion.to_string())
    };

    let mut text: String = chars[..at].iter().collect();
    text.push_str(&inserted);
    text.extend(&chars[at..]);

    Transfer {
        text,
        cursor: at + inserted.chars().count(),
    }
}
