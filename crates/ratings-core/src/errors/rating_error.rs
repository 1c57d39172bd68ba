use std::net::IpAddr;

use crate::models::EntityRef;

/// Expected outcomes of a vote submission that the caller can recover from.
/// Mapping these onto HTTP statuses or messages is the collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("{score} is not a valid rating: expected an integer in [0, {range}]")]
    InvalidRating { score: String, range: i64 },

    #[error("authentication is required to vote on rating {key}")]
    AuthRequired { key: String },

    #[error("too many votes from {ip_address} on this rating (limit {cap})")]
    IpLimitReached { ip_address: IpAddr, cap: u64 },

    #[error("vote already cast and rating {key} does not allow changes")]
    CannotChangeVote { key: String },

    #[error("rating {key} does not allow votes to be retracted")]
    RetractionNotAllowed { key: String },

    #[error("no vote to retract on rating {key}")]
    VoteNotFound { key: String },

    #[error("entity {entity} does not exist")]
    EntityNotFound { entity: EntityRef },

    #[error("entity type {entity_type} has no rating attribute {key}")]
    UnknownRatingKey { entity_type: String, key: String },
}
