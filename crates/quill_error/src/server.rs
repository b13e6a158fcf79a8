//! Error types for the generation backend.

/// Error kinds for backend operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum ServerErrorKind {
    /// HTTP request failed (connection refused, timeout, ...)
    #[display("HTTP request failed: {}", _0)]
    Http(String),

    /// Server answered with a non-success status
    #[display("API error (status {}): {}", status, body)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        body: String,
    },

    /// The token stream broke mid-flight
    #[display("Stream error: {}", _0)]
    Stream(String),
}

/// Error wrapper with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Server Error: {} at line {} in {}", kind, line, file)]
pub struct ServerError {
    /// The error kind
    pub kind: ServerErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl ServerError {
    /// Create a new ServerError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ServerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
