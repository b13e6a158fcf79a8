//! Prompt construction for quill.
//!
//! Turns partially filled story inputs into a deterministic instruction-formatted
//! prompt, and handles the structured idea task on both sides of the model call.
//!
//! # Components
//!
//! - [`evaluate`]: resolves `{a|b|"c d"}` dynamic prompt expressions
//! - [`format_metadata`]: renders story metadata as `# <label>:` blocks
//! - [`classify`]: picks one of six task variants
//! - [`split_continuation`]: separates body text into head and tail
//! - [`PromptAssembler`]: combines all of the above into the final prompt
//! - [`IdeaProcessor`]: stop sequences, fast-mode suffixes, safe-mode filtering
//!
//! Every operation here is synchronous and total. Missing or empty inputs are
//! omitted from the output rather than reported as errors.
//!
//! # Example
//!
//! ```
//! use quill_core::{GenerationContextBuilder, Rating, StoryMetadataBuilder};
//! use quill_prompt::{PromptAssembler, INST_CLOSE};
//!
//! let metadata = StoryMetadataBuilder::default()
//!     .title("星降る夜の冒険")
//!     .synopsis("リナの旅")
//!     .build()
//!     .unwrap();
//! let context = GenerationContextBuilder::default()
//!     .metadata(metadata)
//!     .build()
//!     .unwrap();
//!
//! let prompt = PromptAssembler::new(Rating::General).build(&context);
//! assert!(prompt.contains("# あらすじ:\nリナの旅"));
//! assert!(prompt.ends_with(INST_CLOSE));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assemble;
mod classify;
mod dynamic;
mod format;
mod idea;
mod split;
mod transfer;

pub use assemble::{AssembledPrompt, INST_CLOSE, INST_OPEN, PromptAssembler, build_prompt, wrap_instruction};
pub use classify::classify;
pub use dynamic::{evaluate, evaluate_with};
pub use format::{evaluate_metadata_with, format_metadata, format_metadata_with};
pub use idea::{FastModeCheck, IdeaPlan, IdeaProcessor};
pub use split::{TAIL_LINES, split_continuation};
pub use transfer::{Transfer, extract_field_value, transfer_to_main};
