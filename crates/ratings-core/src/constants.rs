/// Ratings system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default upper bound of the score domain `[0, range]`.
pub const DEFAULT_RANGE: i64 = 2;

/// Default smoothing constant for the weighted rating.
pub const DEFAULT_WEIGHT: u64 = 0;

/// Default number of votes a single IP may hold per (entity, key).
pub const DEFAULT_VOTES_PER_IP: u64 = 3;

/// Score value reserved to mean "retract my vote".
pub const RETRACTION_SCORE: i64 = 0;

/// Length of a derived rating key, in hex characters.
pub const RATING_KEY_LEN: usize = 32;

/// Default similarity strength threshold (`agrees / (disagrees + epsilon)`).
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 3.0;

/// Default epsilon guarding the similarity ratio against division by zero.
pub const DEFAULT_SIMILARITY_EPSILON: f64 = 0.0001;

/// Default number of read connections in the storage pool.
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

/// Attempts made by the engine when a concurrent insert wins the uniqueness race.
pub const MAX_UNIQUE_RETRIES: usize = 3;
