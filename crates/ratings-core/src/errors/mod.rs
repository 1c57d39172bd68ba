//! Error handling for the ratings system.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod rating_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use rating_error::RatingError;
pub use storage_error::StorageError;

/// Top-level error type. Every fallible public operation returns this.
#[derive(Debug, thiserror::Error)]
pub enum RatingsError {
    #[error(transparent)]
    Rating(#[from] RatingError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RatingsError {
    /// True for the expected, caller-recoverable outcomes of a vote
    /// (bad score, missing auth, IP cap, policy refusals, unknown entity).
    /// Storage and configuration failures are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RatingsError::Rating(_))
    }

    /// The rating outcome, if this is one.
    pub fn as_rating(&self) -> Option<&RatingError> {
        match self {
            RatingsError::Rating(e) => Some(e),
            _ => None,
        }
    }

    /// True when this wraps a storage-level uniqueness violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, RatingsError::Storage(StorageError::UniqueViolation { .. }))
    }
}

/// Convenience alias used across the workspace.
pub type RatingsResult<T> = Result<T, RatingsError>;
