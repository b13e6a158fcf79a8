//! Settings and context-file errors.

use std::fmt;
use std::path::{Path, PathBuf};

/// A settings or context file could not be built, parsed or serialized.
///
/// `source_file` names the file being read when there is one; errors from
/// the bundled defaults or an in-memory string leave it empty.
#[derive(Debug, Clone, derive_more::Error)]
pub struct ConfigError {
    /// What went wrong
    pub message: String,
    /// Settings or context file involved, if any
    pub source_file: Option<PathBuf>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use quill_error::ConfigError;
    ///
    /// let err = ConfigError::new("unknown variant `ollama`, expected `kobold` or `openai_compatible`")
    ///     .with_source_file("quill.toml");
    /// assert!(err.to_string().contains("(reading quill.toml)"));
    /// assert!(err.message.contains("openai_compatible"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            source_file: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Attach the file that was being read.
    pub fn with_source_file(mut self, path: impl AsRef<Path>) -> Self {
        self.source_file = Some(path.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration Error: {}", self.message)?;
        if let Some(path) = &self.source_file {
            write!(f, " (reading {})", path.display())?;
        }
        write!(f, " at line {} in {}", self.line, self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_source_file() {
        let err = ConfigError::new("bad toml");
        let shown = err.to_string();
        assert!(shown.starts_with("Configuration Error: bad toml at line "));
        assert!(!shown.contains("reading"));
    }

    #[test]
    fn records_caller_location() {
        let err = ConfigError::new("x");
        assert!(err.file.ends_with("config.rs"));
        assert!(err.line > 0);
    }
}
