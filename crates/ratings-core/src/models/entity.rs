use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::RATING_KEY_LEN;

/// Stable reference to any rateable entity: a registered type tag plus the
/// entity's numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub entity_id: i64,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, entity_id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.entity_id)
    }
}

/// Identifies one rating attribute on an entity. An entity type may expose
/// several independent attributes, each with its own key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingKey(String);

impl RatingKey {
    /// Use `key` verbatim.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive a fixed-length key from an attribute's field name.
    ///
    /// ```
    /// use ratings_core::RatingKey;
    ///
    /// let key = RatingKey::derive("rating");
    /// assert_eq!(key.as_str().len(), 32);
    /// assert_eq!(key, RatingKey::derive("rating"));
    /// assert_ne!(key, RatingKey::derive("rating2"));
    /// ```
    pub fn derive(field_name: &str) -> Self {
        let hex = blake3::hash(field_name.as_bytes()).to_hex();
        Self(hex.as_str()[..RATING_KEY_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RatingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RatingKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ref_display() {
        assert_eq!(EntityRef::new("article", 42).to_string(), "article:42");
    }

    #[test]
    fn derived_keys_are_hex() {
        let key = RatingKey::derive("quality");
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
