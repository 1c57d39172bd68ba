//! # ratings-storage
//!
//! SQLite persistence for the ratings system: a serialized write connection,
//! a read pool for file-backed databases, versioned migrations, and one query
//! module per relation. `StorageEngine` implements the core storage traits.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use ratings_core::errors::{RatingsError, StorageError};

/// Wrap a message as a generic SQLite storage error.
pub(crate) fn to_storage_err(message: impl Into<String>) -> RatingsError {
    RatingsError::Storage(StorageError::Sqlite {
        message: message.into(),
    })
}

/// Classify a rusqlite error. Uniqueness and primary-key violations become
/// `StorageError::UniqueViolation` so callers can recover from races.
pub(crate) fn map_sqlite_err(err: rusqlite::Error) -> RatingsError {
    if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return RatingsError::Storage(StorageError::UniqueViolation {
                constraint: message.clone().unwrap_or_else(|| failure.to_string()),
            });
        }
    }
    to_storage_err(err.to_string())
}
