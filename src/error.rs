use crate::types::ProgressKey;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SrsError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("concurrency conflict on {key}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        key: ProgressKey,
        expected: u64,
        actual: u64,
    },
    #[error("progress record not found: {0}")]
    NotFound(ProgressKey),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("invalid scheduler config: {0}")]
    Config(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl SrsError {
    /// Whether the caller can recover by reloading or resubmitting.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_) | Self::Config(_))
    }
}

/// Errors reported by a [`crate::repository::ProgressRepository`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(ProgressKey),
    #[error("version conflict on {key}: expected stored version {expected}, found {actual}")]
    VersionConflict {
        key: ProgressKey,
        expected: u64,
        actual: u64,
    },
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<RepositoryError> for SrsError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(key) => SrsError::NotFound(key),
            RepositoryError::VersionConflict {
                key,
                expected,
                actual,
            } => SrsError::ConcurrencyConflict {
                key,
                expected,
                actual,
            },
            RepositoryError::Backend(message) => SrsError::Repository(message),
        }
    }
}
