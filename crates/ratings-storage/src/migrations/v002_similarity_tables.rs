//! V002: similar_users and ignored_entities.

pub const MIGRATION_SQL: &str = r#"
-- Directed user-to-user agreement statistics. Rebuilt wholesale by the
-- similarity job; `exclude` is an operator override.
CREATE TABLE IF NOT EXISTS similar_users (
    from_user_id INTEGER NOT NULL,
    to_user_id INTEGER NOT NULL,
    agrees INTEGER NOT NULL DEFAULT 0,
    disagrees INTEGER NOT NULL DEFAULT 0,
    exclude INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (from_user_id, to_user_id),
    CHECK (from_user_id <> to_user_id)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_similar_users_to ON similar_users(to_user_id);

CREATE TABLE IF NOT EXISTS ignored_entities (
    user_id INTEGER NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    PRIMARY KEY (user_id, entity_type, entity_id)
) STRICT;
"#;
