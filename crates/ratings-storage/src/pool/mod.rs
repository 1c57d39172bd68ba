//! Connection pool managing read/write connections.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use ratings_core::errors::RatingsResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

/// Manages the single write connection and the read connection pool.
pub struct ConnectionPool {
    pub writer: WriteConnection,
    pub readers: ReadPool,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Open a connection pool for the given database file. The writer is
    /// opened first so the file exists before read-only connections attach.
    pub fn open(path: &Path, read_pool_size: usize) -> RatingsResult<Self> {
        let writer = WriteConnection::open(path)?;
        let readers = ReadPool::open(path, read_pool_size)?;
        Ok(Self {
            writer,
            readers,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory connection pool (for testing).
    /// In-memory readers are separate databases and never see the writer's
    /// data; callers route reads through the writer instead.
    pub fn open_in_memory() -> RatingsResult<Self> {
        let writer = WriteConnection::open_in_memory()?;
        let readers = ReadPool::open_in_memory(1)?;
        Ok(Self {
            writer,
            readers,
            db_path: None,
        })
    }
}
