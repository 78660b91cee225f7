//! Error types for assay

use thiserror::Error;

/// Result type alias for assay operations
pub type Result<T> = std::result::Result<T, AssayError>;

/// Errors raised by the engine's own plumbing.
///
/// Assertion outcomes are never returned as errors; they only surface through
/// the [`Reporter`](crate::Reporter). These cover caller usage errors.
#[derive(Error, Debug, Clone)]
pub enum AssayError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid mode: {0}")]
    InvalidMode(String),
}

impl AssayError {
    /// Returns true if this error came from compiling a pattern
    pub fn is_pattern_error(&self) -> bool {
        matches!(self, AssayError::InvalidPattern { .. })
    }
}
