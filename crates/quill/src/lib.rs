//! quill: a novel-writing assistant for local LLM servers.
//!
//! quill turns partially filled story information (title, keywords, genres,
//! synopsis, setting, plot, dialogue amount, rating, author's note) and any
//! existing body text into an instruction-formatted prompt, streams the
//! response from a KoboldCpp or OpenAI-compatible server, and post-processes
//! structured "idea" output.
//!
//! # Quick Start
//!
//! ```no_run
//! use futures::future::AbortHandle;
//! use quill::{GenerationContextBuilder, GenerationSession, Settings, StoryMetadataBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let metadata = StoryMetadataBuilder::default()
//!     .title("星降る夜の冒険")
//!     .synopsis("見習い魔法使いのリナが{旅|冒険}に出る")
//!     .build()?;
//! let context = GenerationContextBuilder::default().metadata(metadata).build()?;
//!
//! let mut session = GenerationSession::from_settings(Settings::load()?);
//! let prepared = session.prepare_generate(&context);
//! let (_handle, registration) = AbortHandle::new_pair();
//! let mut sink = |token: &str| print!("{}", token);
//! session.run(&prepared, &mut sink, registration).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! quill is organized as a workspace with focused crates:
//!
//! - `quill_error` - Error types
//! - `quill_core` - Story model and settings store
//! - `quill_prompt` - Prompt assembly and idea processing
//! - `quill_server` - Streaming backend clients
//!
//! This crate re-exports everything and adds [`GenerationSession`] plus the
//! `quill` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod observability;
pub mod session;

pub use observability::{ObservabilityConfig, init_observability};
pub use session::{
    GenerationSession, IdeaPhase, Prepared, RepeatOptions, RepeatReport, RunReport,
    SessionOutcome, Target, TokenSink,
};

pub use quill_core::{
    ClientType, ContinuationOrder, DialogueLevel, FieldValue, GenerationContext,
    GenerationContextBuilder, GenerationStatus, IdeaField, IdeaSelection, IdeaStrategy,
    InfiniteBehavior, InfiniteGenerationBehavior, Mode, Rating, Settings, StoryMetadata,
    StoryMetadataBuilder, TaskType, TransferMode,
};
pub use quill_error::{
    ConfigError, IoError, PromptError, PromptErrorKind, QuillError, QuillErrorKind, QuillResult,
    ServerError, ServerErrorKind,
};
pub use quill_prompt::{
    AssembledPrompt, FastModeCheck, IdeaPlan, IdeaProcessor, PromptAssembler, Transfer,
    build_prompt, classify, evaluate, extract_field_value, format_metadata, split_continuation,
    transfer_to_main,
};
pub use quill_server::{
    GenerationBackend, GenerationRequest, GenerationRequestBuilder, KoboldClient,
    OpenAiCompatibleClient, SamplerSettings, TokenStream, backend_from_settings,
};
