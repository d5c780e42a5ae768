//! Error types for justification search.
//!
//! "Entailment does not hold" is never an error: it is an empty result.
//! Cancellation is not an error either; it is reported through
//! [`crate::services::Explanations::cancelled`].

use thiserror::Error;

use crate::models::formula::ParseError;

/// Result type alias using justify's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while searching for justifications.
#[derive(Error, Debug)]
pub enum Error {
    /// The decision procedure itself failed.
    #[error("entailment oracle failed: {message}")]
    OracleFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The decision procedure ran out of time.
    #[error("entailment oracle timed out after {elapsed_ms}ms")]
    OracleTimeout { elapsed_ms: u64 },

    /// A strategy or oracle broke its contract (e.g. a non-monotonic oracle).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Invalid search configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Formula parse error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an oracle failure without an underlying cause.
    pub fn oracle_failure(message: impl Into<String>) -> Self {
        Self::OracleFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Create an oracle failure wrapping the error that caused it.
    pub fn oracle_failure_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::OracleFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether a retry with different oracle parameters might succeed.
    pub fn is_oracle_timeout(&self) -> bool {
        matches!(self, Self::OracleTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_errors_are_distinct() {
        let timeout = Error::OracleTimeout { elapsed_ms: 250 };
        let failure = Error::oracle_failure("solver crashed");

        assert!(timeout.is_oracle_timeout());
        assert!(!failure.is_oracle_timeout());
        assert_eq!(timeout.to_string(), "entailment oracle timed out after 250ms");
        assert_eq!(failure.to_string(), "entailment oracle failed: solver crashed");
    }

    #[test]
    fn test_failure_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "pipe closed");
        let err = Error::oracle_failure_with_source("reasoner process died", io);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("pipe closed"));
    }
}
