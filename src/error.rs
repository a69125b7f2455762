//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.
//!
//! No-candidate and self-loop proposals are ordinary chain outcomes and never
//! show up here. Everything in this enum is fatal to the chain or the run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for marginswap operations
#[derive(Error, Debug)]
pub enum SwapError {
    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Row/column sum drift or edge set out of sync with the matrix.
    /// The chain's statistical guarantee is gone once this happens.
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    /// Malformed input matrices (indices outside the universe)
    #[error("Invalid matrix: {message}")]
    InvalidMatrix { message: String },

    /// Configuration errors (invalid CLI arguments)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File not found errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Dataset parse errors
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Run report serialization
    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),
}

/// Type alias for Results using SwapError
pub type Result<T> = std::result::Result<T, SwapError>;

impl SwapError {
    /// Create an invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create an invalid matrix error
    pub fn invalid_matrix(message: impl Into<String>) -> Self {
        Self::InvalidMatrix {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// True for errors that mean the chain state can no longer be trusted
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SwapError::parse(3, "item 'x' is not an integer");
        assert_eq!(err.to_string(), "Parse error at line 3: item 'x' is not an integer");

        let err = SwapError::invariant("row 2 sum drifted from 3 to 4");
        assert!(err.is_invariant_violation());
        assert!(err.to_string().starts_with("Invariant violation"));

        let err = SwapError::config("num_samples must be positive");
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SwapError = io.into();
        assert!(matches!(err, SwapError::Io(_)));
    }
}
