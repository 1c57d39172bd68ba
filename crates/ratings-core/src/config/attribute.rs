//! Per-attribute rating configuration.
//!
//! A host entity type exposes one or more rating attributes. Each carries its
//! own score range, smoothing weight and voting policy.
//!
//! # Examples
//!
//! ```
//! use ratings_core::config::{AttributeDefaults, RatingAttribute};
//!
//! let attr = RatingAttribute::from_defaults("rating", &AttributeDefaults::default())
//!     .with_range(5)
//!     .allow_anonymous(true);
//! assert_eq!(attr.range, 5);
//! assert!(attr.allow_anonymous);
//! assert!(!attr.can_change_vote);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RANGE, DEFAULT_WEIGHT};
use crate::models::{Aggregate, RatingKey};

/// Defaults applied to attributes that do not set an option explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeDefaults {
    /// Maximum score. Default: 2.
    pub range: i64,
    /// Smoothing constant for the weighted rating. Default: 0.
    pub weight: f64,
    /// Whether a voter may change an existing vote. Default: false.
    pub can_change_vote: bool,
    /// Whether anonymous voters may vote. Default: false.
    pub allow_anonymous: bool,
    /// Whether a score of 0 retracts an existing vote. Default: false.
    pub allow_delete: bool,
    /// Whether anonymous voters are told apart by a client-held token. Default: false.
    pub use_anonymous_token: bool,
}

impl Default for AttributeDefaults {
    fn default() -> Self {
        Self {
            range: DEFAULT_RANGE,
            weight: DEFAULT_WEIGHT as f64,
            can_change_vote: false,
            allow_anonymous: false,
            allow_delete: false,
            use_anonymous_token: false,
        }
    }
}

/// One rating attribute of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingAttribute {
    /// Field name on the host entity.
    pub name: String,
    pub key: RatingKey,
    pub range: i64,
    pub weight: f64,
    pub can_change_vote: bool,
    pub allow_anonymous: bool,
    pub allow_delete: bool,
    pub use_anonymous_token: bool,
}

impl RatingAttribute {
    /// Build an attribute named `name` with a key derived from the name.
    pub fn from_defaults(name: impl Into<String>, defaults: &AttributeDefaults) -> Self {
        let name = name.into();
        Self {
            key: RatingKey::derive(&name),
            name,
            range: defaults.range,
            weight: defaults.weight,
            can_change_vote: defaults.can_change_vote,
            allow_anonymous: defaults.allow_anonymous,
            allow_delete: defaults.allow_delete,
            use_anonymous_token: defaults.use_anonymous_token,
        }
    }

    pub fn with_key(mut self, key: RatingKey) -> Self {
        self.key = key;
        self
    }

    pub fn with_range(mut self, range: i64) -> Self {
        self.range = range;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn can_change_vote(mut self, allowed: bool) -> Self {
        self.can_change_vote = allowed;
        self
    }

    pub fn allow_anonymous(mut self, allowed: bool) -> Self {
        self.allow_anonymous = allowed;
        self
    }

    pub fn allow_delete(mut self, allowed: bool) -> Self {
        self.allow_delete = allowed;
        self
    }

    pub fn use_anonymous_token(mut self, enabled: bool) -> Self {
        self.use_anonymous_token = enabled;
        self
    }

    pub fn weighted_rating(&self, aggregate: &Aggregate) -> f64 {
        aggregate.weighted_rating(self.weight)
    }

    pub fn raw_rating(&self, aggregate: &Aggregate) -> f64 {
        aggregate.raw_rating()
    }

    pub fn percent(&self, aggregate: &Aggregate) -> f64 {
        aggregate.percent(self.range, self.weight)
    }

    pub fn real_percent(&self, aggregate: &Aggregate) -> f64 {
        aggregate.real_percent(self.range)
    }

    pub fn opinion_percent(&self, aggregate: &Aggregate) -> f64 {
        aggregate.opinion_percent(self.range, self.weight)
    }
}
