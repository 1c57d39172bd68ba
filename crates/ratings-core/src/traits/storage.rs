use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::errors::RatingsResult;
use crate::models::{
    Aggregate, EntityRef, IgnoredEntity, NewVote, RatingKey, RecommendationQuery,
    SimilarityEdge, Vote, VoteFilter, VoterIdentity,
};

/// Storage primitives available inside one atomic unit of work.
///
/// Everything done through a `VoteTransaction` commits together or not at all.
/// Implementations hold the write lock for the whole unit, so aggregate
/// read-modify-write cycles never interleave.
pub trait VoteTransaction {
    // --- Votes ---
    fn find_vote(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        identity: &VoterIdentity,
    ) -> RatingsResult<Option<Vote>>;
    fn count_votes_from_ip(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        ip_address: &IpAddr,
    ) -> RatingsResult<u64>;
    /// Fails with `StorageError::UniqueViolation` if the voter already holds a
    /// vote for (entity, key).
    fn insert_vote(&self, vote: &NewVote, now: DateTime<Utc>) -> RatingsResult<Vote>;
    fn update_vote_score(&self, vote_id: i64, score: i64, now: DateTime<Utc>) -> RatingsResult<()>;
    fn delete_vote(&self, vote_id: i64) -> RatingsResult<()>;
    /// Delete every vote matching `filter` and return the deleted rows.
    fn delete_votes(&self, filter: &VoteFilter) -> RatingsResult<Vec<Vote>>;
    /// Live (score sum, vote count) computed from the vote rows.
    fn tally_votes(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<(i64, u64)>;
    /// Distinct keys that have at least one vote on `entity`.
    fn voted_keys(&self, entity: &EntityRef) -> RatingsResult<Vec<RatingKey>>;

    // --- Aggregates ---
    /// Get-or-create the aggregate row, then add the deltas to it.
    fn apply_aggregate_delta(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        score_delta: i64,
        votes_delta: i64,
    ) -> RatingsResult<Aggregate>;
    /// Create or overwrite the aggregate row.
    fn put_aggregate(&self, aggregate: &Aggregate) -> RatingsResult<()>;
}

/// Vote and aggregate storage.
pub trait IRatingStorage: Send + Sync {
    /// Run `op` as one atomic unit. Any error rolls everything back and is
    /// returned unchanged.
    fn atomic(
        &self,
        op: &mut dyn FnMut(&dyn VoteTransaction) -> RatingsResult<()>,
    ) -> RatingsResult<()>;

    // --- Reads ---
    fn get_vote(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        identity: &VoterIdentity,
    ) -> RatingsResult<Option<Vote>>;
    fn list_votes(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<Vec<Vote>>;
    fn get_aggregate(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<Option<Aggregate>>;
}

/// Similarity edges, ignored entities and the recommendation query.
pub trait ISimilarityStorage: Send + Sync {
    /// All votes cast by authenticated users.
    fn user_votes(&self) -> RatingsResult<Vec<Vote>>;
    /// Replace the whole edge set in one transaction. Existing exclude flags
    /// are kept for pairs present in `edges`.
    fn replace_edges(&self, edges: &[SimilarityEdge]) -> RatingsResult<usize>;
    fn list_edges(&self) -> RatingsResult<Vec<SimilarityEdge>>;
    fn edges_to(&self, to_user_id: i64) -> RatingsResult<Vec<SimilarityEdge>>;
    /// Returns false when no such edge exists.
    fn set_edge_excluded(&self, from_user_id: i64, to_user_id: i64, exclude: bool) -> RatingsResult<bool>;

    fn ignore_entity(&self, ignored: &IgnoredEntity) -> RatingsResult<()>;
    fn unignore_entity(&self, ignored: &IgnoredEntity) -> RatingsResult<bool>;
    fn ignored_entities(&self, user_id: i64, entity_type: &str) -> RatingsResult<Vec<EntityRef>>;

    /// Entities liked by users similar to `query.user_id`, minus the ones the
    /// user voted on or ignored, ordered by entity id.
    fn recommend(&self, query: &RecommendationQuery) -> RatingsResult<Vec<EntityRef>>;
}
