use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_READ_POOL_SIZE;

/// SQLite storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Read connections opened for file-backed databases. Default: 4.
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            read_pool_size: DEFAULT_READ_POOL_SIZE,
        }
    }
}
