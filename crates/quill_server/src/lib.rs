//! Streaming clients for local text-generation servers.
//!
//! The prompt pipeline hands a finished prompt to a [`GenerationBackend`] and
//! consumes a [`TokenStream`]. Two servers are supported:
//!
//! - [`KoboldClient`]: KoboldCpp's `/api/extra/generate/stream`
//! - [`OpenAiCompatibleClient`]: any `/v1/completions` server with streaming
//!
//! [`backend_from_settings`] picks one from the settings store.
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use quill_core::Settings;
//! use quill_server::{GenerationRequestBuilder, backend_from_settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load()?;
//! let backend = backend_from_settings(&settings);
//! let request = GenerationRequestBuilder::default()
//!     .prompt("<s>[INST] 続きを書いてください。 [/INST]")
//!     .max_length(settings.max_length_generate)
//!     .build()?;
//!
//! let mut tokens = backend.generate_stream(&request).await?;
//! while let Some(token) = tokens.next().await {
//!     print!("{}", token?);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod http;
mod kobold;
mod openai;
mod request;
mod sse;

pub use backend::{GenerationBackend, TokenStream, backend_from_settings};
pub use kobold::{KOBOLD_STREAM_PATH, KoboldClient, KoboldPayload, parse_kobold_event};
pub use openai::{COMPLETIONS_PATH, CompletionPayload, OpenAiCompatibleClient, parse_completion_event};
pub use request::{GenerationRequest, GenerationRequestBuilder, SamplerSettings};
pub use sse::{DONE, SseDecoder, SseEvent, token_stream};
