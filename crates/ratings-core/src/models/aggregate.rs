//! Denormalized running (score sum, vote count) per (entity, key) and the
//! rating read-outs derived from it.

use serde::{Deserialize, Serialize};

use super::{EntityRef, RatingKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub entity: EntityRef,
    pub key: RatingKey,
    /// Sum of all live vote scores.
    pub score: i64,
    /// Count of live votes.
    pub votes: u64,
}

impl Aggregate {
    pub fn empty(entity: EntityRef, key: RatingKey) -> Self {
        Self {
            entity,
            key,
            score: 0,
            votes: 0,
        }
    }

    /// `score / (votes + weight)`, or 0 with no votes.
    pub fn weighted_rating(&self, weight: f64) -> f64 {
        if self.votes == 0 {
            return 0.0;
        }
        self.score as f64 / (self.votes as f64 + weight)
    }

    /// `score / votes`, or 0 with no votes.
    pub fn raw_rating(&self) -> f64 {
        if self.votes == 0 {
            return 0.0;
        }
        self.score as f64 / self.votes as f64
    }

    /// Weighted rating as a percentage of `range`.
    pub fn percent(&self, range: i64, weight: f64) -> f64 {
        scale_to_percent(self.weighted_rating(weight), range)
    }

    /// Raw rating as a percentage of `range`.
    pub fn real_percent(&self, range: i64) -> f64 {
        scale_to_percent(self.raw_rating(), range)
    }

    /// Neutral-based percentage: `(percent + 100) / 2`.
    pub fn opinion_percent(&self, range: i64, weight: f64) -> f64 {
        (self.percent(range, weight) + 100.0) / 2.0
    }
}

fn scale_to_percent(rating: f64, range: i64) -> f64 {
    if range <= 0 {
        return 0.0;
    }
    100.0 * rating / range as f64
}
