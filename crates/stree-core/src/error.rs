//! Error types and handling for parsing and formatting

use std::path::PathBuf;
use thiserror::Error;

/// The single error kind produced while turning source into a tree
///
/// Tokenizer failures, grammar errors, and token-ledger misses all surface
/// through this type. Parsing stops at the first one; no partial tree is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    /// 1-based line
    pub line: usize,
    /// 0-based character column
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Main error type for driver and CLI operations
#[derive(Debug, Error)]
pub enum StreeError {
    /// Syntax errors and tree construction failures
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Source declares an encoding that cannot be read
    #[error("Unsupported source encoding '{encoding}' in '{path}'")]
    Encoding { encoding: String, path: PathBuf },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Formatting produced output that does not reformat to itself
    #[error("Formatting of '{path}' is not idempotent")]
    NotIdempotent { path: PathBuf },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Encoding,
    Config,
    Io,
    Idempotence,
    Internal,
}

impl StreeError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreeError::Parse(_) => ErrorKind::Parse,
            StreeError::Encoding { .. } => ErrorKind::Encoding,
            StreeError::ConfigError { .. } => ErrorKind::Config,
            StreeError::IoError { .. } => ErrorKind::Io,
            StreeError::NotIdempotent { .. } => ErrorKind::Idempotence,
            StreeError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Whether a batch run can move on to the next file after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parse | ErrorKind::Encoding | ErrorKind::Idempotence
        )
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// The parse error inside, if this is one
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            StreeError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for StreeError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_display_their_position() {
        let err = ParseError::new("unexpected 'end'", 3, 4);
        assert_eq!(err.to_string(), "unexpected 'end' at line 3, column 4");
    }

    #[test]
    fn parse_errors_are_recoverable_in_batches() {
        let err: StreeError = ParseError::new("boom", 1, 0).into();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.is_recoverable());
        assert!(err.as_parse_error().is_some());

        let err = StreeError::config_error("bad width");
        assert!(!err.is_recoverable());
    }
}
