//! Prompt model error types.
//!
//! The pipeline operations are total; these errors are raised only when a
//! caller hands in a name that does not map onto the story model, or asks
//! the CLI to extract a field that is not there.

/// Specific error conditions for prompt model parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PromptErrorKind {
    /// Field key is not one of the idea fields
    #[display("Unknown idea field: '{}'", _0)]
    UnknownField(String),
    /// Selection is neither "all" nor an idea field
    #[display("Unknown idea selection: '{}'", _0)]
    UnknownSelection(String),
    /// Value cannot be parsed for the named setting or enum
    #[display("Invalid value '{}' for {}", value, field)]
    InvalidValue {
        /// What was being parsed
        field: String,
        /// The rejected input
        value: String,
    },
    /// Text handed to field extraction has no section for the field
    #[display("No '{}' section found in input", _0)]
    MissingSection(String),
}

/// Error type for prompt model parsing.
///
/// # Examples
///
/// ```
/// use quill_error::{PromptError, PromptErrorKind};
///
/// let err = PromptError::new(PromptErrorKind::UnknownField("mood".into()));
/// assert!(format!("{}", err).contains("mood"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Prompt Error: {} at line {} in {}", kind, line, file)]
pub struct PromptError {
    /// The specific error condition
    pub kind: PromptErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PromptError {
    /// Create a new PromptError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PromptErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for [`PromptErrorKind::InvalidValue`].
    #[track_caller]
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(PromptErrorKind::InvalidValue {
            field: field.into(),
            value: value.into(),
        })
    }
}
