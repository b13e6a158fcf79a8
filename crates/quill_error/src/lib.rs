//! Error types for quill.
//!
//! This crate provides the foundation error types used throughout the quill workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! The prompt pipeline itself is total and never fails for data-shape reasons.
//! Errors only arise at the edges: settings files, the generation backend, and
//! parsing user-supplied enum names.
//!
//! # Examples
//!
//! ```
//! use quill_error::{ConfigError, QuillResult};
//!
//! fn load() -> QuillResult<String> {
//!     Err(ConfigError::new("Missing quill.toml"))?
//! }
//!
//! match load() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod io;
mod prompt;
mod server;

pub use config::ConfigError;
pub use error::{QuillError, QuillErrorKind, QuillResult};
pub use io::IoError;
pub use prompt::{PromptError, PromptErrorKind};
pub use server::{ServerError, ServerErrorKind};
