//! Error types
//!
//! Source-data errors (I/O, decoding, unknown ids) are always propagated.
//! Cache failures live in [`crate::index::store::CacheError`] and never reach callers.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for corpus operations
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("boundary scan of {} failed: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid UTF-8 at line {line}")]
    Decode { line: usize },

    #[error("unknown document id: {document_id}")]
    UnknownDocument { document_id: String },

    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Result type alias for corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;

impl CorpusError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CorpusError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unknown(document_id: impl Into<String>) -> Self {
        CorpusError::UnknownDocument {
            document_id: document_id.into(),
        }
    }

    /// True for errors caused by the caller rather than the source file
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CorpusError::UnknownDocument { .. } | CorpusError::Pattern { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CorpusError::unknown("42");
        assert_eq!(err.to_string(), "unknown document id: 42");

        let err = CorpusError::Decode { line: 7 };
        assert_eq!(err.to_string(), "invalid UTF-8 at line 7");
    }

    #[test]
    fn test_caller_errors() {
        assert!(CorpusError::unknown("1").is_caller_error());
        assert!(!CorpusError::Decode { line: 0 }.is_caller_error());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!CorpusError::io("/tmp/x", io).is_caller_error());
    }
}
