//! Voter identity: an authenticated user, or an anonymous fingerprint made
//! of the client IP and an optional client-held token.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// The identity a vote is attributed to. Exactly one of user or fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoterIdentity {
    User {
        user_id: i64,
    },
    Anonymous {
        ip_address: IpAddr,
        token: Option<String>,
    },
}

impl VoterIdentity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, VoterIdentity::Anonymous { .. })
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            VoterIdentity::User { user_id } => Some(*user_id),
            VoterIdentity::Anonymous { .. } => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            VoterIdentity::Anonymous { token, .. } => token.as_deref(),
            VoterIdentity::User { .. } => None,
        }
    }

    /// Canonical text form persisted in the unique index.
    pub fn voter_key(&self) -> String {
        match self {
            VoterIdentity::User { user_id } => format!("user:{user_id}"),
            VoterIdentity::Anonymous {
                ip_address,
                token: None,
            } => format!("ip:{ip_address}"),
            VoterIdentity::Anonymous {
                ip_address,
                token: Some(token),
            } => format!("ip:{ip_address}/{token}"),
        }
    }
}

impl fmt::Display for VoterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.voter_key())
    }
}

/// What a request-like collaborator knows about the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterContext {
    pub user_id: Option<i64>,
    pub ip_address: IpAddr,
    /// Opaque per-client token from a previous vote, if the client holds one.
    pub token: Option<String>,
}

impl VoterContext {
    pub fn authenticated(user_id: i64, ip_address: IpAddr) -> Self {
        Self {
            user_id: Some(user_id),
            ip_address,
            token: None,
        }
    }

    pub fn anonymous(ip_address: IpAddr) -> Self {
        Self {
            user_id: None,
            ip_address,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Resolve to a voter identity. The client token only takes part in an
    /// anonymous identity when the attribute tracks tokens.
    pub fn resolve(&self, use_token: bool) -> VoterIdentity {
        match self.user_id {
            Some(user_id) => VoterIdentity::User { user_id },
            None => VoterIdentity::Anonymous {
                ip_address: self.ip_address,
                token: if use_token { self.token.clone() } else { None },
            },
        }
    }
}
