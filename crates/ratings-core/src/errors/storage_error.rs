/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("uniqueness constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("connection lock poisoned: {which}")]
    LockPoisoned { which: String },
}
