use serde::{Deserialize, Serialize};

use super::{EntityRef, RatingKey};

/// Directed agreement statistics between two users over co-rated entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub agrees: u64,
    pub disagrees: u64,
    /// Operator override: never use this pair for recommendations.
    #[serde(default)]
    pub exclude: bool,
}

impl SimilarityEdge {
    /// `agrees / (disagrees + epsilon)`.
    pub fn strength(&self, epsilon: f64) -> f64 {
        self.agrees as f64 / (self.disagrees as f64 + epsilon)
    }

    pub fn is_similar(&self, epsilon: f64, threshold: f64) -> bool {
        self.strength(epsilon) > threshold
    }
}

/// An entity a user asked never to be recommended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IgnoredEntity {
    pub user_id: i64,
    pub entity: EntityRef,
}

/// Parameters of a recommendation lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationQuery {
    pub user_id: i64,
    pub entity_type: String,
    /// Only votes at or above this score from similar users count.
    pub min_score: i64,
    /// Per rating key minimums. A vote on a listed key is held to its key's
    /// minimum instead of `min_score`.
    pub key_min_scores: Vec<(RatingKey, i64)>,
    pub offset: u64,
    pub limit: u64,
}
