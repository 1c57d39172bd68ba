use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Aggregate, EntityRef, RatingKey, VoterIdentity};
use crate::errors::RatingError;

/// One persisted vote: at most one per (entity, key, voter identity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub entity: EntityRef,
    pub key: RatingKey,
    pub score: i64,
    pub user_id: Option<i64>,
    /// Originating address, recorded for every vote including authenticated ones.
    pub ip_address: IpAddr,
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

impl Vote {
    pub fn identity(&self) -> VoterIdentity {
        match self.user_id {
            Some(user_id) => VoterIdentity::User { user_id },
            None => VoterIdentity::Anonymous {
                ip_address: self.ip_address,
                token: self.token.clone(),
            },
        }
    }

    /// "<user> (<ip>)" for authenticated votes, the bare IP otherwise.
    pub fn voter_display(&self) -> String {
        match self.user_id {
            Some(user_id) => format!("{user_id} ({})", self.ip_address),
            None => self.ip_address.to_string(),
        }
    }

    /// The originating address with its last component masked.
    pub fn partial_ip_address(&self) -> String {
        match self.ip_address {
            IpAddr::V4(v4) => {
                let [a, b, c, _] = v4.octets();
                format!("{a}.{b}.{c}.xxx")
            }
            IpAddr::V6(v6) => {
                let segments = v6.segments();
                let head: Vec<String> = segments[..7].iter().map(|s| format!("{s:x}")).collect();
                format!("{}:xxxx", head.join(":"))
            }
        }
    }
}

/// Input for inserting a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub entity: EntityRef,
    pub key: RatingKey,
    pub score: i64,
    pub identity: VoterIdentity,
    pub ip_address: IpAddr,
}

/// Selects votes for bulk deletion. Unset fields match everything; at least
/// one field must be set for a purge to be accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteFilter {
    pub ip_address: Option<IpAddr>,
    pub user_id: Option<i64>,
    pub entity: Option<EntityRef>,
}

impl VoteFilter {
    pub fn by_ip(ip_address: IpAddr) -> Self {
        Self {
            ip_address: Some(ip_address),
            ..Self::default()
        }
    }

    pub fn by_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ip_address.is_none() && self.user_id.is_none() && self.entity.is_none()
    }
}

/// Which branch a successful submission took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChange {
    Added,
    Changed,
    Retracted,
}

/// Result of a successful vote submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub change: VoteChange,
    /// Aggregate after the write.
    pub aggregate: Aggregate,
    /// Score held before this submission, if the voter had one.
    pub previous_score: Option<i64>,
    /// Anonymous-voter token to hand back to the client, when tokens are on.
    pub token: Option<String>,
}

/// Parse raw client input into an integer score.
///
/// ```
/// use ratings_core::parse_score;
///
/// assert_eq!(parse_score(" 2 ", 5).unwrap(), 2);
/// assert!(parse_score("2.5", 5).is_err());
/// ```
pub fn parse_score(raw: &str, range: i64) -> Result<i64, RatingError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| RatingError::InvalidRating {
            score: raw.to_string(),
            range,
        })
}
