//! Error types for eventrow
//!
//! Row accessors never fail. Everything here belongs to the collaborators that
//! build rows (parser, columnar conversion, configuration).

use std::fmt;

/// Result type alias for eventrow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for eventrow
#[derive(Debug)]
pub enum Error {
    /// Arrow-related errors
    Arrow(arrow_schema::ArrowError),
    /// IO errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// Invalid schema
    InvalidSchema(String),
    /// Timestamp column absent from a raw record
    MissingTimestamp(String),
    /// Timestamp present but unparsable
    InvalidTimestamp(String),
    /// A raw record could not be turned into a row
    Parse { line: Option<usize>, reason: String },
    /// Serialized row carries a version tag no variant is registered for
    UnknownVersion(String),
}

impl Error {
    /// Attach a 1-based input line number to a parse failure.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Error::Parse { reason, .. } => Error::Parse {
                line: Some(line),
                reason,
            },
            Error::MissingTimestamp(_) | Error::InvalidTimestamp(_) | Error::Serialization(_) => {
                Error::Parse {
                    line: Some(line),
                    reason: self.to_string(),
                }
            }
            other => other,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Arrow(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Arrow(e) => write!(f, "Arrow error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::InvalidSchema(msg) => write!(f, "Invalid schema: {}", msg),
            Error::MissingTimestamp(column) => {
                write!(f, "Missing timestamp column '{}'", column)
            }
            Error::InvalidTimestamp(msg) => write!(f, "Invalid timestamp: {}", msg),
            Error::Parse { line: Some(line), reason } => {
                write!(f, "Parse error at line {}: {}", line, reason)
            }
            Error::Parse { line: None, reason } => write!(f, "Parse error: {}", reason),
            Error::UnknownVersion(tag) => write!(f, "Unknown row version: {}", tag),
        }
    }
}

impl From<arrow_schema::ArrowError> for Error {
    fn from(e: arrow_schema::ArrowError) -> Self {
        Error::Arrow(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_line_wraps_timestamp_errors() {
        let err = Error::MissingTimestamp("ts".to_string()).at_line(7);
        match err {
            Error::Parse { line, reason } => {
                assert_eq!(line, Some(7));
                assert!(reason.contains("ts"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_at_line_keeps_config_errors() {
        let err = Error::Config("bad".to_string()).at_line(3);
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_display() {
        let err = Error::Parse {
            line: Some(2),
            reason: "metric 'clicks' is not numeric".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Parse error at line 2: metric 'clicks' is not numeric"
        );
        assert_eq!(
            Error::UnknownVersion("v9".into()).to_string(),
            "Unknown row version: v9"
        );
    }
}
