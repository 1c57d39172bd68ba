//! SimilarityEngine: full similarity rebuild, recommendations, and the
//! operator controls (exclude a pair, ignore an entity).

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ratings_core::config::RatingsConfig;
use ratings_core::errors::RatingsResult;
use ratings_core::models::{EntityRef, IgnoredEntity, RatingKey, RecommendationQuery, SimilarityEdge};
use ratings_core::traits::ISimilarityStorage;
use ratings_engine::EntityRegistry;

use crate::pairwise;

/// Summary of one `recompute_all` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityReport {
    /// Authenticated votes scanned.
    pub votes_scanned: usize,
    /// Distinct user pairs with at least one co-rated attribute.
    pub pairs_considered: usize,
    /// Directed edges written.
    pub edges_written: usize,
    pub duration_ms: u64,
}

pub struct SimilarityEngine {
    storage: Arc<dyn ISimilarityStorage>,
    registry: Arc<EntityRegistry>,
    config: RatingsConfig,
}

impl SimilarityEngine {
    pub fn new(
        storage: Arc<dyn ISimilarityStorage>,
        registry: Arc<EntityRegistry>,
        config: RatingsConfig,
    ) -> Self {
        Self {
            storage,
            registry,
            config,
        }
    }

    /// Rebuild the whole edge set from the current votes.
    ///
    /// Readers see either the old edge set or the new one. Operator
    /// exclusions survive for pairs that are still similar. Safe to re-run;
    /// with no intervening votes the result is identical.
    pub fn recompute_all(&self) -> RatingsResult<SimilarityReport> {
        let started = Instant::now();
        let votes = self.storage.user_votes()?;
        let result = pairwise::compute_edges(&votes, &self.config.similarity);
        let edges_written = self.storage.replace_edges(&result.edges)?;

        let report = SimilarityReport {
            votes_scanned: votes.len(),
            pairs_considered: result.pairs_considered,
            edges_written,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            votes = report.votes_scanned,
            pairs = report.pairs_considered,
            edges = report.edges_written,
            duration_ms = report.duration_ms,
            "similarity rebuilt"
        );
        Ok(report)
    }

    /// Entities of `entity_type` that users similar to `user_id` rated at or
    /// above the minimum score, excluding anything the user voted on or
    /// ignored. Ordered by entity id.
    ///
    /// Without a configured `min_recommend_score`, each rating attribute of
    /// the type is held to its own top score.
    pub fn get_recommendations(
        &self,
        user_id: i64,
        entity_type: &str,
        offset: u64,
        limit: u64,
    ) -> RatingsResult<Vec<EntityRef>> {
        let query = RecommendationQuery {
            user_id,
            entity_type: entity_type.to_string(),
            min_score: self.config.min_recommend_score(),
            key_min_scores: self.key_min_scores(entity_type),
            offset,
            limit,
        };
        let entities = self.storage.recommend(&query)?;
        debug!(user_id, entity_type, found = entities.len(), "recommendations");
        Ok(entities)
    }

    /// Top score of every rating attribute on `entity_type`, or nothing when
    /// a fixed minimum is configured.
    fn key_min_scores(&self, entity_type: &str) -> Vec<(RatingKey, i64)> {
        if self.config.similarity.min_recommend_score.is_some() {
            return Vec::new();
        }
        if !self.registry.is_registered(entity_type) {
            debug!(entity_type, "unregistered entity type, using the default range");
            return Vec::new();
        }
        self.registry
            .attributes(entity_type)
            .iter()
            .map(|a| (a.key.clone(), a.range))
            .collect()
    }

    /// Every stored edge.
    pub fn list_edges(&self) -> RatingsResult<Vec<SimilarityEdge>> {
        self.storage.list_edges()
    }

    /// Edges into `user_id`: the users considered similar to them.
    pub fn similar_users(&self, user_id: i64) -> RatingsResult<Vec<SimilarityEdge>> {
        self.storage.edges_to(user_id)
    }

    /// Stop (or resume) using `from_user_id`'s votes to recommend to
    /// `to_user_id`. Returns false if the pair isn't currently similar.
    pub fn set_excluded(&self, from_user_id: i64, to_user_id: i64, exclude: bool) -> RatingsResult<bool> {
        let found = self
            .storage
            .set_edge_excluded(from_user_id, to_user_id, exclude)?;
        info!(from_user_id, to_user_id, exclude, found, "similarity edge exclusion set");
        Ok(found)
    }

    pub fn ignore_entity(&self, user_id: i64, entity: &EntityRef) -> RatingsResult<()> {
        self.storage.ignore_entity(&IgnoredEntity {
            user_id,
            entity: entity.clone(),
        })?;
        debug!(user_id, entity = %entity, "entity ignored");
        Ok(())
    }

    /// Returns false if the entity wasn't ignored.
    pub fn unignore_entity(&self, user_id: i64, entity: &EntityRef) -> RatingsResult<bool> {
        self.storage.unignore_entity(&IgnoredEntity {
            user_id,
            entity: entity.clone(),
        })
    }

    pub fn ignored_entities(&self, user_id: i64, entity_type: &str) -> RatingsResult<Vec<EntityRef>> {
        self.storage.ignored_entities(user_id, entity_type)
    }
}
