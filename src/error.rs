//! Error types for log analysis

use std::fmt;

/// Result type alias for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur while reading or analysing a ping log
#[derive(Debug)]
pub enum AnalysisError {
    /// A record could not be parsed (1-based line number)
    MalformedRecord { line: usize, reason: String },

    /// An address did not carry a usable `ipv4/mask` suffix
    InvalidAddress { address: String, reason: String },

    /// An observation for an address arrived before a previous one
    OutOfOrder {
        address: String,
        previous: i64,
        timestamp: i64,
    },

    /// Invalid analysis parameters
    InvalidConfig(String),

    /// I/O error (file access, etc.)
    IoError(std::io::Error),
}

impl AnalysisError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        AnalysisError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::MalformedRecord { line, reason } => {
                write!(f, "malformed record on line {}: {}", line, reason)
            }
            AnalysisError::InvalidAddress { address, reason } => {
                write!(f, "invalid address '{}': {}", address, reason)
            }
            AnalysisError::OutOfOrder {
                address,
                previous,
                timestamp,
            } => write!(
                f,
                "observation for {} at {} arrived after {}",
                address, timestamp, previous
            ),
            AnalysisError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            AnalysisError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::IoError(err)
    }
}
