//! Task classification.

use quill_core::{Mode, StoryMetadata, TaskType};
use tracing::{debug, warn};

/// Pick the [`TaskType`] for a request.
///
/// Generate mode counts the dialogue level as metadata; idea mode does not.
/// Unknown modes fall back to `GEN_ZERO` with a warning.
///
/// # Examples
///
/// ```
/// use quill_core::{Mode, StoryMetadata, TaskType};
/// use quill_prompt::classify;
///
/// let empty = StoryMetadata::default();
/// assert_eq!(classify(&Mode::Generate, "", &empty), TaskType::GenZero);
/// assert_eq!(classify(&Mode::Generate, "x", &empty), TaskType::ContZero);
/// ```
pub fn classify(mode: &Mode, body_text: &str, metadata: &StoryMetadata) -> TaskType {
    let has_body = !body_text.trim().is_empty();

    let task = match mode {
        Mode::Generate => {
            let has_metadata = metadata.has_any_content(true);
            match (has_body, has_metadata) {
                (false, false) => TaskType::GenZero,
                (false, true) => TaskType::GenInfo,
                (true, false) => TaskType::ContZero,
                (true, true) => TaskType::ContInfo,
            }
        }
        Mode::Idea => {
            if metadata.has_any_content(false) {
                TaskType::IdeaInfo
            } else {
                TaskType::IdeaZero
            }
        }
        Mode::Unknown(name) => {
            warn!(mode = %name, "Unknown mode, defaulting to GEN_ZERO");
            TaskType::GenZero
        }
    };

    debug!(%mode, has_body, task = %task, "Classified task");
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{DialogueLevel, StoryMetadataBuilder};

    fn with_title() -> StoryMetadata {
        StoryMetadataBuilder::default().title("t").build().unwrap()
    }

    #[test]
    fn decision_table() {
        let empty = StoryMetadata::default();
        let filled = with_title();
        assert_eq!(classify(&Mode::Generate, "", &empty), TaskType::GenZero);
        assert_eq!(classify(&Mode::Generate, "  \n", &filled), TaskType::GenInfo);
        assert_eq!(classify(&Mode::Generate, "x", &empty), TaskType::ContZero);
        assert_eq!(classify(&Mode::Generate, "x", &filled), TaskType::ContInfo);
        assert_eq!(classify(&Mode::Idea, "", &empty), TaskType::IdeaZero);
        assert_eq!(classify(&Mode::Idea, "body", &filled), TaskType::IdeaInfo);
    }

    #[test]
    fn dialogue_level_only_counts_for_generate() {
        let metadata = StoryMetadataBuilder::default()
            .dialogue_level(DialogueLevel::Few)
            .build()
            .unwrap();
        assert_eq!(classify(&Mode::Generate, "", &metadata), TaskType::GenInfo);
        assert_eq!(classify(&Mode::Idea, "", &metadata), TaskType::IdeaZero);
    }

    #[test]
    fn unknown_mode_fails_soft() {
        let mode = Mode::Unknown("poem".into());
        assert_eq!(classify(&mode, "body", &with_title()), TaskType::GenZero);
    }
}
