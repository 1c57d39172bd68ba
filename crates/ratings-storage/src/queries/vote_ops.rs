//! Insert, update, get, delete, tally and bulk ops for votes.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use ratings_core::errors::RatingsResult;
use ratings_core::models::{EntityRef, NewVote, RatingKey, Vote, VoteFilter, VoterIdentity};

use crate::{map_sqlite_err, to_storage_err};

const VOTE_COLUMNS: &str = "id, entity_type, entity_id, rating_key, score, user_id, ip_address, \
                            token, created_at, changed_at";

/// Find the vote held by `identity` on (entity, key).
pub fn find_vote(
    conn: &Connection,
    entity: &EntityRef,
    key: &RatingKey,
    identity: &VoterIdentity,
) -> RatingsResult<Option<Vote>> {
    let sql = format!(
        "SELECT {VOTE_COLUMNS} FROM votes
         WHERE entity_type = ?1 AND entity_id = ?2 AND rating_key = ?3 AND voter_key = ?4"
    );
    conn.query_row(
        &sql,
        params![
            entity.entity_type,
            entity.entity_id,
            key.as_str(),
            identity.voter_key()
        ],
        row_to_vote,
    )
    .optional()
    .map_err(map_sqlite_err)
}

/// Number of votes recorded from `ip_address` on (entity, key), whoever cast them.
pub fn count_votes_from_ip(
    conn: &Connection,
    entity: &EntityRef,
    key: &RatingKey,
    ip_address: &IpAddr,
) -> RatingsResult<u64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM votes
             WHERE entity_type = ?1 AND entity_id = ?2 AND rating_key = ?3 AND ip_address = ?4",
            params![
                entity.entity_type,
                entity.entity_id,
                key.as_str(),
                ip_address.to_string()
            ],
            |row| row.get(0),
        )
        .map_err(map_sqlite_err)?;
    Ok(count as u64)
}

/// Insert a new vote. A second vote by the same voter on (entity, key)
/// surfaces as `StorageError::UniqueViolation`.
pub fn insert_vote(conn: &Connection, vote: &NewVote, now: DateTime<Utc>) -> RatingsResult<Vote> {
    let stamp = now.to_rfc3339();
    conn.execute(
        "INSERT INTO votes (
            entity_type, entity_id, rating_key, score, user_id, ip_address,
            token, voter_key, created_at, changed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            vote.entity.entity_type,
            vote.entity.entity_id,
            vote.key.as_str(),
            vote.score,
            vote.identity.user_id(),
            vote.ip_address.to_string(),
            vote.identity.token(),
            vote.identity.voter_key(),
            stamp,
        ],
    )
    .map_err(map_sqlite_err)?;

    Ok(Vote {
        id: conn.last_insert_rowid(),
        entity: vote.entity.clone(),
        key: vote.key.clone(),
        score: vote.score,
        user_id: vote.identity.user_id(),
        ip_address: vote.ip_address,
        token: vote.identity.token().map(str::to_string),
        created_at: now,
        changed_at: now,
    })
}

/// Change a vote's score and bump its changed-at stamp.
pub fn update_vote_score(
    conn: &Connection,
    vote_id: i64,
    score: i64,
    now: DateTime<Utc>,
) -> RatingsResult<()> {
    let updated = conn
        .execute(
            "UPDATE votes SET score = ?1, changed_at = ?2 WHERE id = ?3",
            params![score, now.to_rfc3339(), vote_id],
        )
        .map_err(map_sqlite_err)?;
    if updated == 0 {
        return Err(to_storage_err(format!("update_vote_score: vote {vote_id} vanished")));
    }
    Ok(())
}

pub fn delete_vote(conn: &Connection, vote_id: i64) -> RatingsResult<()> {
    conn.execute("DELETE FROM votes WHERE id = ?1", params![vote_id])
        .map_err(map_sqlite_err)?;
    Ok(())
}

/// All votes on one rating attribute, oldest first.
pub fn list_votes(conn: &Connection, entity: &EntityRef, key: &RatingKey) -> RatingsResult<Vec<Vote>> {
    let sql = format!(
        "SELECT {VOTE_COLUMNS} FROM votes
         WHERE entity_type = ?1 AND entity_id = ?2 AND rating_key = ?3
         ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![entity.entity_type, entity.entity_id, key.as_str()], row_to_vote)
        .map_err(map_sqlite_err)?;
    collect_rows(rows)
}

/// Votes matching a filter.
pub fn select_votes(conn: &Connection, filter: &VoteFilter) -> RatingsResult<Vec<Vote>> {
    let (where_clause, params_vec) = filter_clause(filter);
    let sql = format!("SELECT {VOTE_COLUMNS} FROM votes WHERE {where_clause} ORDER BY id");
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql).map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params_refs.as_slice(), row_to_vote)
        .map_err(map_sqlite_err)?;
    collect_rows(rows)
}

/// Delete every vote matching `filter` and return the rows that were removed.
/// An empty filter is refused rather than wiping the table.
pub fn delete_votes(conn: &Connection, filter: &VoteFilter) -> RatingsResult<Vec<Vote>> {
    if filter.is_empty() {
        return Err(to_storage_err("delete_votes: refusing an empty filter"));
    }
    let deleted = select_votes(conn, filter)?;
    let (where_clause, params_vec) = filter_clause(filter);
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    conn.execute(&format!("DELETE FROM votes WHERE {where_clause}"), params_refs.as_slice())
        .map_err(map_sqlite_err)?;
    Ok(deleted)
}

/// Live (score sum, vote count) for one rating attribute.
pub fn tally_votes(conn: &Connection, entity: &EntityRef, key: &RatingKey) -> RatingsResult<(i64, u64)> {
    let (score, votes): (i64, i64) = conn
        .query_row(
            "SELECT COALESCE(SUM(score), 0), COUNT(*) FROM votes
             WHERE entity_type = ?1 AND entity_id = ?2 AND rating_key = ?3",
            params![entity.entity_type, entity.entity_id, key.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(map_sqlite_err)?;
    Ok((score, votes as u64))
}

/// Distinct rating keys with at least one vote on `entity`.
pub fn voted_keys(conn: &Connection, entity: &EntityRef) -> RatingsResult<Vec<RatingKey>> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT rating_key FROM votes
             WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY rating_key",
        )
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![entity.entity_type, entity.entity_id], |row| {
            row.get::<_, String>(0).map(RatingKey::new)
        })
        .map_err(map_sqlite_err)?;
    collect_rows(rows)
}

/// Every vote cast by an authenticated user, grouped by (entity, key).
pub fn user_votes(conn: &Connection) -> RatingsResult<Vec<Vote>> {
    let sql = format!(
        "SELECT {VOTE_COLUMNS} FROM votes WHERE user_id IS NOT NULL
         ORDER BY entity_type, entity_id, rating_key, user_id"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sqlite_err)?;
    let rows = stmt.query_map([], row_to_vote).map_err(map_sqlite_err)?;
    collect_rows(rows)
}

fn filter_clause(filter: &VoteFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses = Vec::new();
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(ip) = &filter.ip_address {
        clauses.push("ip_address = ?");
        params_vec.push(Box::new(ip.to_string()));
    }
    if let Some(user_id) = filter.user_id {
        clauses.push("user_id = ?");
        params_vec.push(Box::new(user_id));
    }
    if let Some(entity) = &filter.entity {
        clauses.push("entity_type = ? AND entity_id = ?");
        params_vec.push(Box::new(entity.entity_type.clone()));
        params_vec.push(Box::new(entity.entity_id));
    }

    if clauses.is_empty() {
        ("1=1".to_string(), params_vec)
    } else {
        (clauses.join(" AND "), params_vec)
    }
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> RatingsResult<Vec<T>> {
    rows.map(|r| r.map_err(map_sqlite_err)).collect()
}

fn row_to_vote(row: &Row<'_>) -> rusqlite::Result<Vote> {
    let ip_text: String = row.get(6)?;
    let ip_address = ip_text
        .parse::<IpAddr>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    Ok(Vote {
        id: row.get(0)?,
        entity: EntityRef::new(row.get::<_, String>(1)?, row.get(2)?),
        key: RatingKey::new(row.get::<_, String>(3)?),
        score: row.get(4)?,
        user_id: row.get(5)?,
        ip_address,
        token: row.get(7)?,
        created_at: parse_timestamp(row, 8)?,
        changed_at: parse_timestamp(row, 9)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
