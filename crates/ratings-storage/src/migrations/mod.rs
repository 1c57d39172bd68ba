//! Versioned schema migrations tracked by `PRAGMA user_version`.

pub mod v001_vote_tables;
pub mod v002_similarity_tables;

use rusqlite::Connection;

use ratings_core::errors::{RatingsResult, StorageError};

/// Latest schema version.
pub const LATEST_VERSION: u32 = 2;

/// Apply every migration newer than the database's current version.
pub fn run_migrations(conn: &Connection) -> RatingsResult<()> {
    let current_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::MigrationFailed {
            version: 0,
            reason: e.to_string(),
        })?;

    let migrations: &[(&str, u32)] = &[
        (v001_vote_tables::MIGRATION_SQL, 1),
        (v002_similarity_tables::MIGRATION_SQL, 2),
    ];

    for (sql, version) in migrations {
        if current_version < *version {
            tracing::info!(version, "applying ratings schema migration");
            conn.execute_batch(sql)
                .map_err(|e| StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                })?;
            conn.pragma_update(None, "user_version", version)
                .map_err(|e| StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                })?;
        }
    }
    Ok(())
}

/// Current schema version of a connection.
pub fn schema_version(conn: &Connection) -> RatingsResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| crate::to_storage_err(e.to_string()))
}
