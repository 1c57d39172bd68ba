//! Data model: entity references, voter identities, votes, aggregates,
//! similarity edges and ignored entities.

pub mod aggregate;
pub mod entity;
pub mod identity;
pub mod similarity;
pub mod vote;

pub use aggregate::Aggregate;
pub use entity::{EntityRef, RatingKey};
pub use identity::{VoterContext, VoterIdentity};
pub use similarity::{IgnoredEntity, RecommendationQuery, SimilarityEdge};
pub use vote::{parse_score, NewVote, Vote, VoteChange, VoteFilter, VoteOutcome};
