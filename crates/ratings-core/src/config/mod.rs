//! Configuration for the ratings system.
//! TOML-based, layered: env > file > compiled defaults.

pub mod attribute;
pub mod ratings_config;
pub mod similarity_config;
pub mod storage_config;

pub use attribute::{AttributeDefaults, RatingAttribute};
pub use ratings_config::RatingsConfig;
pub use similarity_config::SimilarityConfig;
pub use storage_config::StorageConfig;
