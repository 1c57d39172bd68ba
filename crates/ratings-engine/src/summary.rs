//! Rating read-outs for one attribute, ready to hand to a presentation layer.

use serde::{Deserialize, Serialize};

use ratings_core::config::RatingAttribute;
use ratings_core::models::Aggregate;

/// Snapshot of an aggregate with every derived rating computed against the
/// attribute's range and weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub attribute: String,
    pub range: i64,
    pub score: i64,
    pub votes: u64,
    /// `score / (votes + weight)`.
    pub weighted: f64,
    /// `score / votes`.
    pub raw: f64,
    /// Weighted rating scaled to 0..=100.
    pub percent: f64,
    /// Raw rating scaled to 0..=100.
    pub real_percent: f64,
    /// `(percent + 100) / 2`.
    pub opinion_percent: f64,
}

impl RatingSummary {
    pub fn new(attribute: &RatingAttribute, aggregate: &Aggregate) -> Self {
        Self {
            attribute: attribute.name.clone(),
            range: attribute.range,
            score: aggregate.score,
            votes: aggregate.votes,
            weighted: attribute.weighted_rating(aggregate),
            raw: attribute.raw_rating(aggregate),
            percent: attribute.percent(aggregate),
            real_percent: attribute.real_percent(aggregate),
            opinion_percent: attribute.opinion_percent(aggregate),
        }
    }
}
