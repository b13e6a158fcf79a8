//! Top-level error wrapper types.

use crate::{ConfigError, IoError, PromptError, ServerError};

/// Every error the quill crates can surface.
///
/// # Examples
///
/// ```
/// use quill_error::{QuillError, ConfigError};
///
/// let err: QuillError = ConfigError::new("bad toml").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum QuillErrorKind {
    /// Settings error
    #[from(ConfigError)]
    Config(ConfigError),
    /// File I/O error
    #[from(IoError)]
    Io(IoError),
    /// Prompt model parsing error
    #[from(PromptError)]
    Prompt(PromptError),
    /// Generation backend error
    #[from(ServerError)]
    Server(ServerError),
}

/// quill error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Quill Error: {}", _0)]
pub struct QuillError(Box<QuillErrorKind>);

impl QuillError {
    /// Create a new error from a kind.
    pub fn new(kind: QuillErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &QuillErrorKind {
        &self.0
    }
}

impl<T> From<T> for QuillError
where
    T: Into<QuillErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for quill operations.
pub type QuillResult<T> = std::result::Result<T, QuillError>;
