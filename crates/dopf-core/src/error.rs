//! Unified error types for the DOPF workspace
//!
//! Domain-specific errors (partitioning, solver, coordinator) live next to the
//! code that raises them. They can be converted into [`DopfError`] at API
//! boundaries so that loaders and the CLI handle them uniformly.
//!
//! # Example
//!
//! ```ignore
//! use dopf_core::{DopfError, DopfResult};
//!
//! fn run(path: &str) -> DopfResult<()> {
//!     let case = load_case(path)?;
//!     solve(&case)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for DOPF operations.
#[derive(Error, Debug)]
pub enum DopfError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors (inconsistent network model)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed area-adjacency declaration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Solver/algorithm errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using DopfError.
pub type DopfResult<T> = Result<T, DopfError>;

impl From<anyhow::Error> for DopfError {
    fn from(err: anyhow::Error) -> Self {
        DopfError::Other(err.to_string())
    }
}

impl From<String> for DopfError {
    fn from(s: String) -> Self {
        DopfError::Other(s)
    }
}

impl From<&str> for DopfError {
    fn from(s: &str) -> Self {
        DopfError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for DopfError {
    fn from(err: serde_json::Error) -> Self {
        DopfError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DopfError::Config("area2 has no parent".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("area2"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DopfError = io_err.into();
        assert!(matches!(err, DopfError::Io(_)));
    }

    #[test]
    fn test_json_error_is_parse() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DopfError = json_err.into();
        assert!(matches!(err, DopfError::Parse(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> DopfResult<()> {
            Err(DopfError::Validation("test".into()))
        }

        fn outer() -> DopfResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
