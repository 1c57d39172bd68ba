//! Top-level ratings configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{AttributeDefaults, SimilarityConfig, StorageConfig};
use crate::constants::DEFAULT_VOTES_PER_IP;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`RATINGS_*`)
/// 2. Config file (`RatingsConfig::load`)
/// 3. Compiled defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingsConfig {
    /// Defaults for rating attributes that don't override an option.
    pub defaults: AttributeDefaults,
    /// Votes one IP may hold per (entity, key). 0 disables the cap. Default: 3.
    pub per_ip_vote_cap: u64,
    pub storage: StorageConfig,
    pub similarity: SimilarityConfig,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            defaults: AttributeDefaults::default(),
            per_ip_vote_cap: DEFAULT_VOTES_PER_IP,
            storage: StorageConfig::default(),
            similarity: SimilarityConfig::default(),
        }
    }
}

impl RatingsConfig {
    /// Load from a TOML file, then apply `RATINGS_*` environment overrides
    /// and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let mut config: RatingsConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.apply_overrides(std::env::vars())?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "ratings config loaded");
        Ok(config)
    }

    /// Compiled defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: RatingsConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
                path: "<string>".to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RATINGS_*` overrides from `(name, value)` pairs. Unrelated
    /// variables are ignored.
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            match name.as_str() {
                "RATINGS_PER_IP_VOTE_CAP" => self.per_ip_vote_cap = parse_env(&name, &value)?,
                "RATINGS_SIMILARITY_THRESHOLD" => {
                    self.similarity.threshold = parse_env(&name, &value)?
                }
                "RATINGS_SIMILARITY_EPSILON" => self.similarity.epsilon = parse_env(&name, &value)?,
                "RATINGS_READ_POOL_SIZE" => {
                    self.storage.read_pool_size = parse_env(&name, &value)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.range < 1 {
            return Err(invalid("defaults.range", "must be at least 1"));
        }
        if !self.defaults.weight.is_finite() || self.defaults.weight < 0.0 {
            return Err(invalid("defaults.weight", "must be a non-negative number"));
        }
        if !self.similarity.epsilon.is_finite() || self.similarity.epsilon <= 0.0 {
            return Err(invalid("similarity.epsilon", "must be greater than 0"));
        }
        if !self.similarity.threshold.is_finite() || self.similarity.threshold < 0.0 {
            return Err(invalid("similarity.threshold", "must be a non-negative number"));
        }
        if self.similarity.agreement_tolerance < 0 {
            return Err(invalid("similarity.agreement_tolerance", "must not be negative"));
        }
        if self.storage.read_pool_size == 0 {
            return Err(invalid("storage.read_pool_size", "must be greater than 0"));
        }
        Ok(())
    }

    /// Score a similar user must have given for an entity to be recommended.
    pub fn min_recommend_score(&self) -> i64 {
        self.similarity
            .min_recommend_score
            .unwrap_or(self.defaults.range)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::ParseError {
        path: format!("${name}"),
        message: format!("cannot parse {value:?}"),
    })
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}
