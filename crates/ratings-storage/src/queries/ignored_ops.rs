//! Per-user ignored entities.

use rusqlite::{params, Connection};

use ratings_core::errors::RatingsResult;
use ratings_core::models::{EntityRef, IgnoredEntity};

use crate::map_sqlite_err;

/// Idempotent: ignoring twice keeps one row.
pub fn ignore(conn: &Connection, ignored: &IgnoredEntity) -> RatingsResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO ignored_entities (user_id, entity_type, entity_id)
         VALUES (?1, ?2, ?3)",
        params![
            ignored.user_id,
            ignored.entity.entity_type,
            ignored.entity.entity_id
        ],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

/// Returns false if the entity wasn't ignored.
pub fn unignore(conn: &Connection, ignored: &IgnoredEntity) -> RatingsResult<bool> {
    let removed = conn
        .execute(
            "DELETE FROM ignored_entities
             WHERE user_id = ?1 AND entity_type = ?2 AND entity_id = ?3",
            params![
                ignored.user_id,
                ignored.entity.entity_type,
                ignored.entity.entity_id
            ],
        )
        .map_err(map_sqlite_err)?;
    Ok(removed > 0)
}

pub fn list_ignored(conn: &Connection, user_id: i64, entity_type: &str) -> RatingsResult<Vec<EntityRef>> {
    let mut stmt = conn
        .prepare(
            "SELECT entity_id FROM ignored_entities
             WHERE user_id = ?1 AND entity_type = ?2 ORDER BY entity_id",
        )
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![user_id, entity_type], |row| row.get::<_, i64>(0))
        .map_err(map_sqlite_err)?;
    rows.map(|r| {
        r.map(|entity_id| EntityRef::new(entity_type, entity_id))
            .map_err(map_sqlite_err)
    })
    .collect()
}
