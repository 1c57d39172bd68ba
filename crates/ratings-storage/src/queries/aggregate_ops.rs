//! Get-or-create, delta and overwrite ops for rating aggregates.

use rusqlite::{params, Connection, OptionalExtension};

use ratings_core::errors::RatingsResult;
use ratings_core::models::{Aggregate, EntityRef, RatingKey};

use crate::map_sqlite_err;

pub fn get_aggregate(
    conn: &Connection,
    entity: &EntityRef,
    key: &RatingKey,
) -> RatingsResult<Option<Aggregate>> {
    conn.query_row(
        "SELECT score, votes FROM rating_aggregates
         WHERE entity_type = ?1 AND entity_id = ?2 AND rating_key = ?3",
        params![entity.entity_type, entity.entity_id, key.as_str()],
        |row| {
            let votes: i64 = row.get(1)?;
            Ok(Aggregate {
                entity: entity.clone(),
                key: key.clone(),
                score: row.get(0)?,
                votes: votes.max(0) as u64,
            })
        },
    )
    .optional()
    .map_err(map_sqlite_err)
}

/// Create a zeroed aggregate row if none exists.
pub fn ensure_aggregate(conn: &Connection, entity: &EntityRef, key: &RatingKey) -> RatingsResult<()> {
    conn.execute(
        "INSERT INTO rating_aggregates (entity_type, entity_id, rating_key, score, votes)
         SELECT ?1, ?2, ?3, 0, 0
         WHERE NOT EXISTS (
             SELECT 1 FROM rating_aggregates
             WHERE entity_type = ?1 AND entity_id = ?2 AND rating_key = ?3
         )",
        params![entity.entity_type, entity.entity_id, key.as_str()],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

/// Add deltas to the aggregate in a single relative UPDATE, creating the row
/// first if needed, and return the new totals.
pub fn apply_delta(
    conn: &Connection,
    entity: &EntityRef,
    key: &RatingKey,
    score_delta: i64,
    votes_delta: i64,
) -> RatingsResult<Aggregate> {
    ensure_aggregate(conn, entity, key)?;
    conn.execute(
        "UPDATE rating_aggregates SET score = score + ?4, votes = votes + ?5
         WHERE entity_type = ?1 AND entity_id = ?2 AND rating_key = ?3",
        params![
            entity.entity_type,
            entity.entity_id,
            key.as_str(),
            score_delta,
            votes_delta
        ],
    )
    .map_err(map_sqlite_err)?;

    get_aggregate(conn, entity, key)?
        .ok_or_else(|| crate::to_storage_err(format!("aggregate {entity}/{key} missing after update")))
}

/// Overwrite the aggregate with recomputed totals, creating it if absent.
pub fn put_aggregate(conn: &Connection, aggregate: &Aggregate) -> RatingsResult<()> {
    ensure_aggregate(conn, &aggregate.entity, &aggregate.key)?;
    conn.execute(
        "UPDATE rating_aggregates SET score = ?4, votes = ?5
         WHERE entity_type = ?1 AND entity_id = ?2 AND rating_key = ?3",
        params![
            aggregate.entity.entity_type,
            aggregate.entity.entity_id,
            aggregate.key.as_str(),
            aggregate.score,
            aggregate.votes as i64
        ],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}
