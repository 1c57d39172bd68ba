//! CascadeRecompute: rebuild aggregates from the surviving votes after bulk
//! vote deletion.
//!
//! Aggregates touched by a bulk delete are never patched incrementally: each
//! affected (entity, key) is re-tallied from the rows that remain and written
//! back, so repeated or overlapping runs converge on the same totals.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ratings_core::errors::RatingsResult;
use ratings_core::models::{Aggregate, EntityRef, RatingKey, Vote, VoteFilter};
use ratings_core::traits::{IRatingStorage, VoteTransaction};

use crate::registry::EntityRegistry;

/// What a purge or recompute touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeReport {
    pub votes_deleted: usize,
    pub entities: usize,
    pub aggregates_recomputed: usize,
}

pub struct CascadeRecompute {
    storage: Arc<dyn IRatingStorage>,
    registry: Arc<EntityRegistry>,
}

impl CascadeRecompute {
    pub fn new(storage: Arc<dyn IRatingStorage>, registry: Arc<EntityRegistry>) -> Self {
        Self { storage, registry }
    }

    /// Delete every vote cast from `ip_address` and recompute what it touched.
    pub fn purge_ip_address(&self, ip_address: IpAddr) -> RatingsResult<RecomputeReport> {
        self.purge(&VoteFilter::by_ip(ip_address))
    }

    /// Delete every vote cast by `user_id` and recompute what it touched.
    pub fn purge_user(&self, user_id: i64) -> RatingsResult<RecomputeReport> {
        self.purge(&VoteFilter::by_user(user_id))
    }

    /// Delete the votes matching `filter` and recompute the affected
    /// aggregates in the same transaction.
    pub fn purge(&self, filter: &VoteFilter) -> RatingsResult<RecomputeReport> {
        let mut report = RecomputeReport::default();
        self.storage.atomic(&mut |tx| {
            let deleted = tx.delete_votes(filter)?;
            report = self.recompute_in(tx, &deleted)?;
            report.votes_deleted = deleted.len();
            Ok(())
        })?;
        info!(
            votes_deleted = report.votes_deleted,
            entities = report.entities,
            aggregates = report.aggregates_recomputed,
            "votes purged"
        );
        Ok(report)
    }

    /// Recompute aggregates for votes that were deleted outside this type.
    pub fn recompute_after_delete(&self, deleted: &[Vote]) -> RatingsResult<RecomputeReport> {
        if deleted.is_empty() {
            return Ok(RecomputeReport::default());
        }
        let mut report = RecomputeReport::default();
        self.storage.atomic(&mut |tx| {
            report = self.recompute_in(tx, deleted)?;
            Ok(())
        })?;
        info!(
            entities = report.entities,
            aggregates = report.aggregates_recomputed,
            "aggregates recomputed after delete"
        );
        Ok(report)
    }

    /// Re-tally every rating attribute of one entity from its live votes.
    pub fn recompute_entity(&self, entity: &EntityRef) -> RatingsResult<RecomputeReport> {
        let mut report = RecomputeReport::default();
        self.storage.atomic(&mut |tx| {
            report.aggregates_recomputed = self.recompute_entity_in(tx, entity, &BTreeSet::new())?;
            report.entities = 1;
            Ok(())
        })?;
        debug!(entity = %entity, aggregates = report.aggregates_recomputed, "entity recomputed");
        Ok(report)
    }

    fn recompute_in(&self, tx: &dyn VoteTransaction, deleted: &[Vote]) -> RatingsResult<RecomputeReport> {
        let mut affected: BTreeMap<EntityRef, BTreeSet<RatingKey>> = BTreeMap::new();
        for vote in deleted {
            affected
                .entry(vote.entity.clone())
                .or_default()
                .insert(vote.key.clone());
        }

        let mut report = RecomputeReport {
            entities: affected.len(),
            ..RecomputeReport::default()
        };
        for (entity, keys) in &affected {
            report.aggregates_recomputed += self.recompute_entity_in(tx, entity, keys)?;
        }
        Ok(report)
    }

    /// Recompute the registered keys of `entity`, plus `extra_keys` and any
    /// key that still has votes. Returns the number of aggregates written.
    fn recompute_entity_in(
        &self,
        tx: &dyn VoteTransaction,
        entity: &EntityRef,
        extra_keys: &BTreeSet<RatingKey>,
    ) -> RatingsResult<usize> {
        let mut keys: BTreeSet<RatingKey> = self
            .registry
            .attributes(&entity.entity_type)
            .iter()
            .map(|a| a.key.clone())
            .collect();
        keys.extend(extra_keys.iter().cloned());
        keys.extend(tx.voted_keys(entity)?);

        let resolver = self.registry.try_resolve(entity)?;
        if resolver.is_none() {
            debug!(entity = %entity, "entity no longer resolves, skipping cached fields");
        }

        for key in &keys {
            let (score, votes) = tx.tally_votes(entity, key)?;
            let aggregate = Aggregate {
                entity: entity.clone(),
                key: key.clone(),
                score,
                votes,
            };
            tx.put_aggregate(&aggregate)?;
            if let Some(resolver) = resolver {
                resolver.store_cached(&aggregate)?;
            }
        }
        Ok(keys.len())
    }
}
