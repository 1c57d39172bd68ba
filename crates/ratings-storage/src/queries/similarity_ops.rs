//! Similarity edge replace/list/exclude and the recommendation query.

use std::collections::HashSet;

use rusqlite::{params, Connection, Row, ToSql};

use ratings_core::errors::RatingsResult;
use ratings_core::models::{EntityRef, RatingKey, RecommendationQuery, SimilarityEdge};

use crate::map_sqlite_err;

const EDGE_COLUMNS: &str = "from_user_id, to_user_id, agrees, disagrees, exclude";

pub fn list_edges(conn: &Connection) -> RatingsResult<Vec<SimilarityEdge>> {
    let sql = format!("SELECT {EDGE_COLUMNS} FROM similar_users ORDER BY from_user_id, to_user_id");
    let mut stmt = conn.prepare(&sql).map_err(map_sqlite_err)?;
    let rows = stmt.query_map([], row_to_edge).map_err(map_sqlite_err)?;
    rows.map(|r| r.map_err(map_sqlite_err)).collect()
}

/// Edges pointing at `to_user_id`, i.e. the users similar to them.
pub fn edges_to(conn: &Connection, to_user_id: i64) -> RatingsResult<Vec<SimilarityEdge>> {
    let sql = format!(
        "SELECT {EDGE_COLUMNS} FROM similar_users WHERE to_user_id = ?1 ORDER BY from_user_id"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![to_user_id], row_to_edge)
        .map_err(map_sqlite_err)?;
    rows.map(|r| r.map_err(map_sqlite_err)).collect()
}

/// Truncate the edge table and insert `edges`. Pairs an operator excluded
/// before the rebuild stay excluded. Call inside a transaction.
pub fn replace_edges(conn: &Connection, edges: &[SimilarityEdge]) -> RatingsResult<usize> {
    let excluded = excluded_pairs(conn)?;

    conn.execute("DELETE FROM similar_users", [])
        .map_err(map_sqlite_err)?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO similar_users (from_user_id, to_user_id, agrees, disagrees, exclude)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(map_sqlite_err)?;
    for edge in edges {
        let exclude = edge.exclude || excluded.contains(&(edge.from_user_id, edge.to_user_id));
        stmt.execute(params![
            edge.from_user_id,
            edge.to_user_id,
            edge.agrees as i64,
            edge.disagrees as i64,
            exclude as i32
        ])
        .map_err(map_sqlite_err)?;
    }
    Ok(edges.len())
}

fn excluded_pairs(conn: &Connection) -> RatingsResult<HashSet<(i64, i64)>> {
    let mut stmt = conn
        .prepare("SELECT from_user_id, to_user_id FROM similar_users WHERE exclude = 1")
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(map_sqlite_err)?;
    rows.map(|r| r.map_err(map_sqlite_err)).collect()
}

/// Set the exclude flag on one edge. Returns false if the edge doesn't exist.
pub fn set_excluded(conn: &Connection, from_user_id: i64, to_user_id: i64, exclude: bool) -> RatingsResult<bool> {
    let changed = conn
        .execute(
            "UPDATE similar_users SET exclude = ?3 WHERE from_user_id = ?1 AND to_user_id = ?2",
            params![from_user_id, to_user_id, exclude as i32],
        )
        .map_err(map_sqlite_err)?;
    Ok(changed > 0)
}

/// Entities of `query.entity_type` that users similar to `query.user_id`
/// scored at least the minimum for the vote's rating key, excluding entities
/// the user voted on or ignored. Deduplicated and ordered by entity id.
pub fn recommend(conn: &Connection, query: &RecommendationQuery) -> RatingsResult<Vec<EntityRef>> {
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![
        Box::new(query.user_id),
        Box::new(query.entity_type.clone()),
        Box::new(query.min_score),
        Box::new(query.limit.min(i64::MAX as u64) as i64),
        Box::new(query.offset.min(i64::MAX as u64) as i64),
    ];
    let threshold = min_score_expr(&query.key_min_scores, &mut params_vec);
    let sql = format!(
        "SELECT DISTINCT v.entity_id
         FROM votes v
         JOIN similar_users s
           ON s.from_user_id = v.user_id
          AND s.to_user_id = ?1
          AND s.exclude = 0
         WHERE v.entity_type = ?2
           AND v.score >= {threshold}
           AND v.entity_id NOT IN (
               SELECT entity_id FROM votes
               WHERE user_id = ?1 AND entity_type = ?2
           )
           AND v.entity_id NOT IN (
               SELECT entity_id FROM ignored_entities
               WHERE user_id = ?1 AND entity_type = ?2
           )
         ORDER BY v.entity_id
         LIMIT ?4 OFFSET ?5"
    );
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql).map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params_refs.as_slice(), |row| row.get::<_, i64>(0))
        .map_err(map_sqlite_err)?;

    rows.map(|r| {
        r.map(|entity_id| EntityRef::new(query.entity_type.clone(), entity_id))
            .map_err(map_sqlite_err)
    })
    .collect()
}

/// `?3` alone, or a `CASE` on `v.rating_key` that falls back to `?3` for
/// keys without their own minimum. Binds the per-key pairs after `?5`.
fn min_score_expr(key_min_scores: &[(RatingKey, i64)], params_vec: &mut Vec<Box<dyn ToSql>>) -> String {
    if key_min_scores.is_empty() {
        return "?3".to_string();
    }
    let mut expr = String::from("CASE v.rating_key");
    for (key, min_score) in key_min_scores {
        let key_idx = params_vec.len() + 1;
        expr.push_str(&format!(" WHEN ?{key_idx} THEN ?{}", key_idx + 1));
        params_vec.push(Box::new(key.as_str().to_string()));
        params_vec.push(Box::new(*min_score));
    }
    expr.push_str(" ELSE ?3 END");
    expr
}

fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<SimilarityEdge> {
    let agrees: i64 = row.get(2)?;
    let disagrees: i64 = row.get(3)?;
    let exclude: i64 = row.get(4)?;
    Ok(SimilarityEdge {
        from_user_id: row.get(0)?,
        to_user_id: row.get(1)?,
        agrees: agrees.max(0) as u64,
        disagrees: disagrees.max(0) as u64,
        exclude: exclude != 0,
    })
}
