//! Domain errors for the scenario deduplication engine.

use thiserror::Error;

/// Domain-level errors that can occur during a deduplication run.
///
/// Only [`DomainError::EmbeddingService`] is fatal to a run. Every other
/// variant is recovered from at the component that raised it and surfaces
/// in the run report instead of aborting.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Relation service error: {0}")]
    RelationService(String),

    #[error("Judgment service transport error: {0}")]
    JudgmentTransport(String),

    #[error("Judgment response format error: {0}")]
    JudgmentFormat(String),

    #[error("Malformed scenario record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DomainError {
    /// Returns true if a run cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingService(_) | Self::InvalidInput(_) | Self::Io(_)
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_embedding_failure_is_fatal_among_service_errors() {
        assert!(DomainError::EmbeddingService("down".into()).is_fatal());
        assert!(!DomainError::RelationService("bad".into()).is_fatal());
        assert!(!DomainError::JudgmentTransport("timeout".into()).is_fatal());
        assert!(!DomainError::JudgmentFormat("not json".into()).is_fatal());
        assert!(!DomainError::MalformedRecord {
            index: 3,
            reason: "no fields".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::MalformedRecord {
            index: 2,
            reason: "all fields empty".into(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed scenario record at index 2: all fields empty"
        );
    }
}
