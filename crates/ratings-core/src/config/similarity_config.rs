use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SIMILARITY_EPSILON, DEFAULT_SIMILARITY_THRESHOLD};

/// Similarity rebuild and recommendation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// A pair is similar when `agrees / (disagrees + epsilon)` exceeds this. Default: 3.
    pub threshold: f64,
    /// Default: 0.0001.
    pub epsilon: f64,
    /// Two scores agree when they differ by at most this much. Default: 0 (exact).
    pub agreement_tolerance: i64,
    /// Minimum score a similar user must have given for an entity to be
    /// recommended. `None` means the highest score bucket.
    pub min_recommend_score: Option<i64>,
}

impl SimilarityConfig {
    /// Whether two scores count as agreement.
    pub fn agrees(&self, a: i64, b: i64) -> bool {
        (a - b).abs() <= self.agreement_tolerance
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            epsilon: DEFAULT_SIMILARITY_EPSILON,
            agreement_tolerance: 0,
            min_recommend_score: None,
        }
    }
}
