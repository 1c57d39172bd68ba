//! StorageEngine: owns the ConnectionPool, runs migrations, and implements
//! IRatingStorage + ISimilarityStorage.

use std::net::IpAddr;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use ratings_core::config::StorageConfig;
use ratings_core::errors::RatingsResult;
use ratings_core::models::{
    Aggregate, EntityRef, IgnoredEntity, NewVote, RatingKey, RecommendationQuery,
    SimilarityEdge, Vote, VoteFilter, VoterIdentity,
};
use ratings_core::traits::{IRatingStorage, ISimilarityStorage, VoteTransaction};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{aggregate_ops, ignored_ops, similarity_ops, vote_ops};

/// The main storage engine. Owns the connection pool and provides the vote,
/// aggregate and similarity storage interfaces.
pub struct StorageEngine {
    pool: ConnectionPool,
    /// When true, use the read pool for read operations (file-backed mode).
    /// When false, route all reads through the writer (in-memory mode,
    /// because in-memory read pool connections are isolated databases).
    use_read_pool: bool,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk.
    pub fn open(path: &Path) -> RatingsResult<Self> {
        Self::open_with_config(path, &StorageConfig::default())
    }

    pub fn open_with_config(path: &Path, config: &StorageConfig) -> RatingsResult<Self> {
        let pool = ConnectionPool::open(path, config.read_pool_size)?;
        let engine = Self {
            pool,
            use_read_pool: true,
        };
        engine.initialize()?;
        tracing::debug!(path = %path.display(), readers = engine.pool.readers.size(), "ratings storage opened");
        Ok(engine)
    }

    /// Open an in-memory storage engine (for testing).
    pub fn open_in_memory() -> RatingsResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let engine = Self {
            pool,
            use_read_pool: false,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> RatingsResult<()> {
        self.pool
            .writer
            .with_conn_sync(migrations::run_migrations)
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> RatingsResult<u32> {
        self.pool.writer.with_conn_sync(migrations::schema_version)
    }

    /// Execute a read-only query on the best available connection.
    fn with_reader<F, T>(&self, f: F) -> RatingsResult<T>
    where
        F: FnOnce(&Connection) -> RatingsResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn_sync(f)
        }
    }
}

/// `VoteTransaction` over a connection that is inside an open transaction.
struct SqliteVoteTx<'a> {
    conn: &'a Connection,
}

impl VoteTransaction for SqliteVoteTx<'_> {
    fn find_vote(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        identity: &VoterIdentity,
    ) -> RatingsResult<Option<Vote>> {
        vote_ops::find_vote(self.conn, entity, key, identity)
    }

    fn count_votes_from_ip(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        ip_address: &IpAddr,
    ) -> RatingsResult<u64> {
        vote_ops::count_votes_from_ip(self.conn, entity, key, ip_address)
    }

    fn insert_vote(&self, vote: &NewVote, now: DateTime<Utc>) -> RatingsResult<Vote> {
        vote_ops::insert_vote(self.conn, vote, now)
    }

    fn update_vote_score(&self, vote_id: i64, score: i64, now: DateTime<Utc>) -> RatingsResult<()> {
        vote_ops::update_vote_score(self.conn, vote_id, score, now)
    }

    fn delete_vote(&self, vote_id: i64) -> RatingsResult<()> {
        vote_ops::delete_vote(self.conn, vote_id)
    }

    fn delete_votes(&self, filter: &VoteFilter) -> RatingsResult<Vec<Vote>> {
        vote_ops::delete_votes(self.conn, filter)
    }

    fn tally_votes(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<(i64, u64)> {
        vote_ops::tally_votes(self.conn, entity, key)
    }

    fn voted_keys(&self, entity: &EntityRef) -> RatingsResult<Vec<RatingKey>> {
        vote_ops::voted_keys(self.conn, entity)
    }

    fn apply_aggregate_delta(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        score_delta: i64,
        votes_delta: i64,
    ) -> RatingsResult<Aggregate> {
        aggregate_ops::apply_delta(self.conn, entity, key, score_delta, votes_delta)
    }

    fn put_aggregate(&self, aggregate: &Aggregate) -> RatingsResult<()> {
        aggregate_ops::put_aggregate(self.conn, aggregate)
    }
}

impl IRatingStorage for StorageEngine {
    fn atomic(
        &self,
        op: &mut dyn FnMut(&dyn VoteTransaction) -> RatingsResult<()>,
    ) -> RatingsResult<()> {
        let result = self.pool.writer.with_immediate_transaction(|tx| {
            let unit = SqliteVoteTx { conn: tx };
            op(&unit)
        });
        if let Err(ref err) = result {
            tracing::debug!(error = %err, "ratings transaction rolled back");
        }
        result
    }

    fn get_vote(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        identity: &VoterIdentity,
    ) -> RatingsResult<Option<Vote>> {
        self.with_reader(|conn| vote_ops::find_vote(conn, entity, key, identity))
    }

    fn list_votes(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<Vec<Vote>> {
        self.with_reader(|conn| vote_ops::list_votes(conn, entity, key))
    }

    fn get_aggregate(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<Option<Aggregate>> {
        self.with_reader(|conn| aggregate_ops::get_aggregate(conn, entity, key))
    }
}

impl ISimilarityStorage for StorageEngine {
    fn user_votes(&self) -> RatingsResult<Vec<Vote>> {
        self.with_reader(vote_ops::user_votes)
    }

    fn replace_edges(&self, edges: &[SimilarityEdge]) -> RatingsResult<usize> {
        let written = self
            .pool
            .writer
            .with_immediate_transaction(|tx| similarity_ops::replace_edges(tx, edges))?;
        tracing::info!(edges = written, "similarity edges replaced");
        Ok(written)
    }

    fn list_edges(&self) -> RatingsResult<Vec<SimilarityEdge>> {
        self.with_reader(similarity_ops::list_edges)
    }

    fn edges_to(&self, to_user_id: i64) -> RatingsResult<Vec<SimilarityEdge>> {
        self.with_reader(|conn| similarity_ops::edges_to(conn, to_user_id))
    }

    fn set_edge_excluded(&self, from_user_id: i64, to_user_id: i64, exclude: bool) -> RatingsResult<bool> {
        self.pool.writer.with_conn_sync(|conn| {
            similarity_ops::set_excluded(conn, from_user_id, to_user_id, exclude)
        })
    }

    fn ignore_entity(&self, ignored: &IgnoredEntity) -> RatingsResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| ignored_ops::ignore(conn, ignored))
    }

    fn unignore_entity(&self, ignored: &IgnoredEntity) -> RatingsResult<bool> {
        self.pool
            .writer
            .with_conn_sync(|conn| ignored_ops::unignore(conn, ignored))
    }

    fn ignored_entities(&self, user_id: i64, entity_type: &str) -> RatingsResult<Vec<EntityRef>> {
        self.with_reader(|conn| ignored_ops::list_ignored(conn, user_id, entity_type))
    }

    fn recommend(&self, query: &RecommendationQuery) -> RatingsResult<Vec<EntityRef>> {
        self.with_reader(|conn| similarity_ops::recommend(conn, query))
    }
}
