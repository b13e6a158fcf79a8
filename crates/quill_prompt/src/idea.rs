//! Idea task processing.
//!
//! Stop sequences, fast-mode priming, and safe-mode extraction all rely on the
//! `# <label>:` headers the model was trained to emit. Everything that depends
//! on that convention lives behind [`IdeaProcessor`].

use crate::format::field_block;
use quill_core::{IdeaField, IdeaSelection, IdeaStrategy, StoryMetadata};
use rand::Rng;
use tracing::{debug, instrument, warn};

/// Result of the fast-mode prerequisite check.
///
/// The check is a soft gate: an unmet result carries a warning for the caller
/// to surface, but generation still proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastModeCheck {
    /// Whether at least one preceding field has content
    met: bool,
    /// Human-readable warning when not met
    warning: Option<String>,
    /// Preceding fields without content
    missing: Vec<IdeaField>,
}

/// Everything the host needs to run one idea generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaPlan {
    /// Target field or all
    selection: IdeaSelection,
    /// Strategy in use
    strategy: IdeaStrategy,
    /// Explicit stop sequence, `None` to run to natural end
    stop_sequence: Option<Vec<String>>,
    /// Text appended after the base prompt (fast mode)
    suffix: String,
    /// Prerequisite check, fast mode on a single field only
    prerequisites: Option<FastModeCheck>,
    /// Stream tokens to the caller as they arrive
    use_streaming: bool,
    /// Collect the full response and extract the selected field
    requires_filtering: bool,
}

impl FastModeCheck {
    /// Whether at least one preceding field has content.
    pub fn met(&self) -> bool {
        self.met
    }

    /// Warning to surface when not met.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Preceding fields without content.
    pub fn missing(&self) -> &[IdeaField] {
        &self.missing
    }
}

impl IdeaPlan {
    /// Target field or all.
    pub fn selection(&self) -> IdeaSelection {
        self.selection
    }

    /// Strategy in use.
    pub fn strategy(&self) -> IdeaStrategy {
        self.strategy
    }

    /// Explicit stop sequence.
    pub fn stop_sequence(&self) -> Option<&[String]> {
        self.stop_sequence.as_deref()
    }

    /// Fast-mode priming suffix, possibly empty.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Prerequisite check, when one was made.
    pub fn prerequisites(&self) -> Option<&FastModeCheck> {
        self.prerequisites.as_ref()
    }

    /// Stream tokens as they arrive.
    pub fn use_streaming(&self) -> bool {
        self.use_streaming
    }

    /// Collect then extract the selected field.
    pub fn requires_filtering(&self) -> bool {
        self.requires_filtering
    }
}

/// Applies the idea field rules to one snapshot of story metadata.
#[derive(Debug, Clone, Copy)]
pub struct IdeaProcessor<'a> {
    metadata: &'a StoryMetadata,
}

impl<'a> IdeaProcessor<'a> {
    /// Create a processor over `metadata`.
    pub fn new(metadata: &'a StoryMetadata) -> Self {
        Self { metadata }
    }

    /// Stop sequence that halts generation at the next field's header.
    ///
    /// `None` for [`IdeaSelection::All`] and for the last field.
    ///
    /// # Examples
    ///
    /// ```
    /// use quill_core::{IdeaField, IdeaSelection};
    /// use quill_prompt::IdeaProcessor;
    ///
    /// assert_eq!(
    ///     IdeaProcessor::determine_stop_sequence(IdeaField::Synopsis.into()),
    ///     Some(vec!["\n# 設定:".to_string()])
    /// );
    /// assert_eq!(IdeaProcessor::determine_stop_sequence(IdeaField::Plot.into()), None);
    /// assert_eq!(IdeaProcessor::determine_stop_sequence(IdeaSelection::All), None);
    /// ```
    pub fn determine_stop_sequence(selection: IdeaSelection) -> Option<Vec<String>> {
        let next = selection.field()?.next()?;
        Some(vec![format!("\n{}", next.header())])
    }

    /// Check whether fast mode has anything to prime with.
    #[instrument(skip(self))]
    pub fn check_fast_mode_prerequisites(&self, field: IdeaField) -> FastModeCheck {
        if field.predecessors().is_empty() {
            return FastModeCheck {
                met: false,
                warning: Some(format!(
                    "最初の項目「{}」では高速な手法は使用できません。",
                    field.label()
                )),
                missing: Vec::new(),
            };
        }

        let missing: Vec<IdeaField> = field
            .predecessors()
            .iter()
            .copied()
            .filter(|f| !self.metadata.has_content(*f))
            .collect();
        let met = missing.len() < field.predecessors().len();

        let warning = (!met).then(|| {
            let names: Vec<&str> = missing.iter().map(|f| f.label()).collect();
            format!(
                "高速な手法の前提条件を満たしていません。\n以下の先行項目を入力してください:\n- {}\n\n警告: このまま続行しますが、期待通りの結果にならない可能性があります。",
                names.join(", ")
            )
        });

        debug!(met, missing = missing.len(), "Fast mode prerequisites checked");
        FastModeCheck {
            met,
            warning,
            missing,
        }
    }

    /// Priming suffix built from the filled fields preceding `field`.
    ///
    /// Blocks use the metadata formatter's shape, separated by blank lines, with
    /// two trailing newlines so the model continues with the selected header.
    /// Empty when no predecessor has content.
    pub fn generate_prompt_suffix(&self, field: IdeaField) -> String {
        self.generate_prompt_suffix_with(field, &mut rand::thread_rng())
    }

    /// [`Self::generate_prompt_suffix`] with a caller-supplied RNG for tag evaluation.
    pub fn generate_prompt_suffix_with<R: Rng + ?Sized>(
        &self,
        field: IdeaField,
        rng: &mut R,
    ) -> String {
        let blocks: Vec<String> = field
            .predecessors()
            .iter()
            .filter_map(|f| field_block(self.metadata, *f, &mut *rng))
            .collect();

        if blocks.is_empty() {
            String::new()
        } else {
            format!("{}\n\n", blocks.join("\n\n"))
        }
    }

    /// Extract the selected field's block from a full multi-field response.
    ///
    /// Returns the text from the selected header through just before the
    /// earliest following field header, trimmed. [`IdeaSelection::All`] returns
    /// the text unchanged. A missing header yields an empty string.
    ///
    /// # Examples
    ///
    /// ```
    /// use quill_core::IdeaField;
    /// use quill_prompt::IdeaProcessor;
    ///
    /// let output = "# タイトル:\n星\n\n# あらすじ:\n旅に出る\n\n# 設定:\n森";
    /// assert_eq!(
    ///     IdeaProcessor::filter_output(output, IdeaField::Synopsis.into()),
    ///     "# あらすじ:\n旅に出る"
    /// );
    /// ```
    pub fn filter_output(full_text: &str, selection: IdeaSelection) -> String {
        let Some(field) = selection.field() else {
            return full_text.to_string();
        };

        let header = field.header();
        let Some(start) = full_text.find(&header) else {
            warn!(header = %header, "Selected section not found in model output");
            return String::new();
        };

        let content_start = start + header.len();
        let end = field
            .successors()
            .iter()
            .filter_map(|next| full_text[content_start..].find(&next.header()))
            .min()
            .map(|offset| content_start + offset)
            .unwrap_or(full_text.len());

        full_text[start..end].trim().to_string()
    }

    /// Prepare an idea generation: stop sequence, suffix, and delivery flags.
    ///
    /// Unmet fast-mode prerequisites are logged and recorded on the plan, but
    /// the suffix is still built.
    #[instrument(skip(self), fields(selection = %selection, strategy = %strategy))]
    pub fn plan(&self, selection: IdeaSelection, strategy: IdeaStrategy) -> IdeaPlan {
        let stop_sequence = Self::determine_stop_sequence(selection);

        let (suffix, prerequisites) = match (strategy, selection.field()) {
            (IdeaStrategy::Fast, Some(field)) => {
                let check = self.check_fast_mode_prerequisites(field);
                if let Some(warning) = check.warning() {
                    warn!(field = %field, warning = %warning, "Fast mode prerequisites not met, continuing");
                }
                (self.generate_prompt_suffix(field), Some(check))
            }
            _ => (String::new(), None),
        };

        let is_all = selection == IdeaSelection::All;
        let use_streaming = is_all || strategy == IdeaStrategy::Fast;
        let requires_filtering = strategy == IdeaStrategy::Safe && !is_all;

        debug!(
            stop = ?stop_sequence,
            suffix_len = suffix.len(),
            use_streaming,
            requires_filtering,
            "Idea generation planned"
        );

        IdeaPlan {
            selection,
            strategy,
            stop_sequence,
            suffix,
            prerequisites,
            use_streaming,
            requires_filtering,
        }
    }
}
