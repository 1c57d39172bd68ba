//! V001: votes and rating_aggregates.

pub const MIGRATION_SQL: &str = r#"
-- One row per (entity, rating key, voter). voter_key is the canonical
-- identity text: "user:<id>", "ip:<addr>" or "ip:<addr>/<token>".
CREATE TABLE IF NOT EXISTS votes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    rating_key TEXT NOT NULL,
    score INTEGER NOT NULL,
    user_id INTEGER,
    ip_address TEXT NOT NULL,
    token TEXT,
    voter_key TEXT NOT NULL,
    created_at TEXT NOT NULL,
    changed_at TEXT NOT NULL,
    CHECK (user_id IS NULL OR token IS NULL)
) STRICT;

CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_voter
    ON votes(entity_type, entity_id, rating_key, voter_key);
CREATE INDEX IF NOT EXISTS idx_votes_scope_ip
    ON votes(entity_type, entity_id, rating_key, ip_address);
CREATE INDEX IF NOT EXISTS idx_votes_ip ON votes(ip_address);
CREATE INDEX IF NOT EXISTS idx_votes_user ON votes(user_id)
    WHERE user_id IS NOT NULL;

-- Denormalized running totals, one row per (entity, rating key).
CREATE TABLE IF NOT EXISTS rating_aggregates (
    entity_type TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    rating_key TEXT NOT NULL,
    score INTEGER NOT NULL DEFAULT 0,
    votes INTEGER NOT NULL DEFAULT 0 CHECK (votes >= 0),
    PRIMARY KEY (entity_type, entity_id, rating_key)
) STRICT;
"#;
