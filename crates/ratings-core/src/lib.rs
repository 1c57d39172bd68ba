//! # ratings-core
//!
//! Foundation crate for the ratings system.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;
pub mod tracing_setup;

// Re-export the most commonly used types at the crate root.
pub use config::{AttributeDefaults, RatingAttribute, RatingsConfig, SimilarityConfig};
pub use errors::{ConfigError, RatingError, RatingsError, RatingsResult, StorageError};
pub use models::{
    parse_score, Aggregate, EntityRef, IgnoredEntity, NewVote, RatingKey, SimilarityEdge,
    VoteChange, Vote, VoteFilter, VoteOutcome, VoterContext, VoterIdentity,
};
