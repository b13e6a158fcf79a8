//! Core data types for quill.
//!
//! This crate provides the story model shared by every stage of the prompt
//! pipeline, plus the flat settings store the host reads defaults from.
//!
//! The idea fields and their fixed order live here so that metadata formatting,
//! fast-mode suffixes, stop sequences, and output filtering all agree on a single
//! definition.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod field;
mod metadata;
mod mode;
mod settings;

pub use context::{GenerationContext, GenerationContextBuilder};
pub use field::{FieldValue, IdeaField, IdeaSelection};
pub use metadata::{DialogueLevel, StoryMetadata, StoryMetadataBuilder};
pub use mode::{ContinuationOrder, GenerationStatus, IdeaStrategy, Mode, Rating, TaskType};
pub use settings::{
    ClientType, InfiniteBehavior, InfiniteGenerationBehavior, Settings, TransferMode,
};
