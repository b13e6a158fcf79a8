//! Prompt assembly.

use crate::classify::classify;
use crate::dynamic::evaluate_with;
use crate::format::{evaluate_metadata_with, format_metadata_with};
use crate::split::split_continuation;
use quill_core::{ContinuationOrder, GenerationContext, Rating, Settings, TaskType};
use rand::Rng;
use tracing::{debug, instrument};

/// Opening instruction delimiter (Mistral-instruct).
pub const INST_OPEN: &str = "<s>[INST] ";
/// Closing instruction delimiter.
pub const INST_CLOSE: &str = " [/INST]";

const HEAD_LABEL: &str = "【本文】";
const REFERENCE_LABEL: &str = "【参考情報】";
const AUTHORS_NOTE_LABEL: &str = "【オーサーズノート】";

/// The pieces of an assembled prompt.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct AssembledPrompt {
    /// Classified task
    task: TaskType,
    /// Instruction with rating annotation
    instruction: String,
    /// Input section, empty when omitted
    input: String,
    /// Final wrapped prompt
    prompt: String,
}

impl AssembledPrompt {
    /// Consume and return the final prompt text.
    pub fn into_prompt(self) -> String {
        self.prompt
    }
}

/// Builds instruction-formatted prompts from a [`GenerationContext`].
///
/// Assembly is total: any combination of empty fields degrades to omission.
///
/// # Examples
///
/// ```
/// use quill_core::{GenerationContextBuilder, Rating, StoryMetadataBuilder};
/// use quill_prompt::PromptAssembler;
///
/// let metadata = StoryMetadataBuilder::default()
///     .title("星降る夜の冒険")
///     .build()
///     .unwrap();
/// let context = GenerationContextBuilder::default()
///     .metadata(metadata)
///     .build()
///     .unwrap();
///
/// let prompt = PromptAssembler::new(Rating::General).build(&context);
/// assert!(prompt.contains("# タイトル:\n星降る夜の冒険"));
/// assert!(prompt.ends_with("[/INST]"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler {
    default_rating: Rating,
    default_order: ContinuationOrder,
}

impl PromptAssembler {
    /// Create an assembler that falls back to `default_rating`.
    pub fn new(default_rating: Rating) -> Self {
        Self {
            default_rating,
            default_order: ContinuationOrder::default(),
        }
    }

    /// Set the ordering used when a context does not choose one.
    pub fn with_continuation_order(mut self, order: ContinuationOrder) -> Self {
        self.default_order = order;
        self
    }

    /// Assemble and return only the final prompt text.
    pub fn build(&self, context: &GenerationContext) -> String {
        self.assemble(context).into_prompt()
    }

    /// Assemble using the thread RNG for dynamic prompts.
    pub fn assemble(&self, context: &GenerationContext) -> AssembledPrompt {
        self.assemble_with(context, &mut rand::thread_rng())
    }

    /// Assemble with a caller-supplied RNG.
    #[instrument(
        skip(self, context, rng),
        fields(mode = %context.mode(), body_len = context.body_text().len())
    )]
    pub fn assemble_with<R: Rng + ?Sized>(
        &self,
        context: &GenerationContext,
        rng: &mut R,
    ) -> AssembledPrompt {
        let metadata = evaluate_metadata_with(context.metadata(), &mut *rng);
        let authors_note = evaluate_with(context.authors_note(), &mut *rng);

        let task = classify(context.mode(), context.body_text(), &metadata);

        let rating = context.effective_rating(self.default_rating);
        let instruction = format!("{}\n(レーティング: {})", task.instruction(), rating.label());

        let formatted = format_metadata_with(&metadata, context.mode(), &mut *rng);

        let input = if task.is_continuation() {
            continuation_input(
                context.body_text(),
                &formatted,
                &authors_note,
                context.effective_continuation_order(self.default_order),
            )
        } else {
            formatted
        };

        let prompt = wrap_instruction(&instruction, &input);
        debug!(task = %task, input_len = input.len(), prompt_len = prompt.len(), "Prompt assembled");

        AssembledPrompt {
            task,
            instruction,
            input,
            prompt,
        }
    }
}

impl From<&Settings> for PromptAssembler {
    fn from(settings: &Settings) -> Self {
        Self::new(settings.default_rating).with_continuation_order(settings.cont_prompt_order)
    }
}

/// Convenience wrapper around [`PromptAssembler::build`].
pub fn build_prompt(context: &GenerationContext, default_rating: Rating) -> String {
    PromptAssembler::new(default_rating).build(context)
}

/// Wrap an instruction and optional input in the instruct delimiters.
pub fn wrap_instruction(instruction: &str, input: &str) -> String {
    if input.is_empty() {
        format!("{}{}{}", INST_OPEN, instruction, INST_CLOSE)
    } else {
        format!("{}{}\n\n{}{}", INST_OPEN, instruction, input, INST_CLOSE)
    }
}

fn fenced_block(label: &str, content: &str) -> String {
    format!("{}\n```\n{}\n```", label, content)
}

fn continuation_input(
    body_text: &str,
    reference: &str,
    authors_note: &str,
    order: ContinuationOrder,
) -> String {
    let (head, tail) = split_continuation(body_text);

    let head_block = (!head.is_empty()).then(|| fenced_block(HEAD_LABEL, &head));
    let reference_block =
        (!reference.trim().is_empty()).then(|| fenced_block(REFERENCE_LABEL, reference));
    let note = authors_note.trim();
    let note_block = (!note.is_empty()).then(|| fenced_block(AUTHORS_NOTE_LABEL, note));

    let ordered = match order {
        ContinuationOrder::TextFirst => [head_block, reference_block],
        ContinuationOrder::ReferenceFirst => [reference_block, head_block],
    };

    let mut parts: Vec<String> = ordered.into_iter().flatten().collect();
    parts.extend(note_block);
    if !tail.is_empty() {
        parts.push(tail);
    }

    debug!(parts = parts.len(), %order, "Continuation input built");
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{GenerationContextBuilder, Mode, StoryMetadataBuilder};

    #[test]
    fn zero_task_has_no_input_section() {
        let prompt = build_prompt(&GenerationContext::default(), Rating::General);
        assert_eq!(
            prompt,
            "<s>[INST] 自由に小説を生成してください。\n(レーティング: 全年齢) [/INST]"
        );
    }

    #[test]
    fn rating_override_beats_default() {
        let context = GenerationContextBuilder::default()
            .rating(Rating::R18)
            .build()
            .unwrap();
        let assembled = PromptAssembler::new(Rating::General).assemble(&context);
        assert!(assembled.instruction().ends_with("(レーティング: R-18)"));
    }

    #[test]
    fn text_first_puts_head_before_reference() {
        let metadata = StoryMetadataBuilder::default().title("T").build().unwrap();
        let context = GenerationContextBuilder::default()
            .body_text("h1\nt1\nt2\nt3")
            .metadata(metadata)
            .continuation_order(ContinuationOrder::TextFirst)
            .build()
            .unwrap();
        let assembled = PromptAssembler::default().assemble(&context);
        assert_eq!(*assembled.task(), TaskType::ContInfo);
        assert_eq!(
            assembled.input(),
            "【本文】\n```\nh1\n```\n【参考情報】\n```\n# タイトル:\nT\n```\nt1\nt2\nt3"
        );
    }

    #[test]
    fn reference_first_is_default_order() {
        let metadata = StoryMetadataBuilder::default().title("T").build().unwrap();
        let context = GenerationContextBuilder::default()
            .body_text("h1\nt1\nt2\nt3")
            .metadata(metadata)
            .build()
            .unwrap();
        let assembled = PromptAssembler::default().assemble(&context);
        assert!(assembled.input().starts_with("【参考情報】"));
    }

    #[test]
    fn settings_order_applies_when_context_is_silent() {
        let mut settings = Settings::default();
        settings.cont_prompt_order = ContinuationOrder::TextFirst;
        let metadata = StoryMetadataBuilder::default().title("T").build().unwrap();
        let context = GenerationContextBuilder::default()
            .body_text("h1\nt1\nt2\nt3")
            .metadata(metadata)
            .build()
            .unwrap();
        let assembled = PromptAssembler::from(&settings).assemble(&context);
        assert!(assembled.input().starts_with("【本文】"));
    }

    #[test]
    fn short_body_is_tail_only() {
        let context = GenerationContextBuilder::default()
            .body_text("一行だけ")
            .build()
            .unwrap();
        let assembled = PromptAssembler::default().assemble(&context);
        assert_eq!(*assembled.task(), TaskType::ContZero);
        assert_eq!(assembled.input(), "一行だけ");
    }

    #[test]
    fn authors_note_ignored_outside_continuation() {
        let context = GenerationContextBuilder::default()
            .mode(Mode::Idea)
            .authors_note("note")
            .build()
            .unwrap();
        let assembled = PromptAssembler::default().assemble(&context);
        assert_eq!(*assembled.task(), TaskType::IdeaZero);
        assert!(assembled.input().is_empty());
    }

    #[test]
    fn unknown_mode_keeps_metadata() {
        let metadata = StoryMetadataBuilder::default().title("T").build().unwrap();
        let context = GenerationContextBuilder::default()
            .mode(Mode::Unknown("poem".into()))
            .metadata(metadata)
            .build()
            .unwrap();
        let assembled = PromptAssembler::default().assemble(&context);
        assert_eq!(*assembled.task(), TaskType::GenZero);
        assert_eq!(assembled.input(), "# タイトル:\nT");
    }

    #[test]
    fn tags_resolving_to_nothing_do_not_count_as_content() {
        let metadata = StoryMetadataBuilder::default()
            .keywords(vec![r#"{""}"#.to_string()])
            .build()
            .unwrap();
        let context = GenerationContextBuilder::default()
            .metadata(metadata)
            .build()
            .unwrap();
        let assembled = PromptAssembler::default().assemble(&context);
        assert_eq!(*assembled.task(), TaskType::GenZero);
        assert!(assembled.input().is_empty());
    }
}
