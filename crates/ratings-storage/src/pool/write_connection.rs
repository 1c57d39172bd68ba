//! The single serialized write connection and its IMMEDIATE transactions.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use ratings_core::errors::{RatingsResult, StorageError};

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path) -> RatingsResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| to_storage_err(format!("open write connection: {e}")))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> RatingsResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| to_storage_err(format!("open in-memory write connection: {e}")))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive access to the write connection.
    pub fn with_conn_sync<F, T>(&self, f: F) -> RatingsResult<T>
    where
        F: FnOnce(&Connection) -> RatingsResult<T>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::LockPoisoned {
            which: "write connection".to_string(),
        })?;
        f(&guard)
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction. The database write lock
    /// is taken up front, so other processes block on `busy_timeout` instead
    /// of failing mid-transaction. Any error from `f` rolls back.
    pub fn with_immediate_transaction<F, T>(&self, f: F) -> RatingsResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> RatingsResult<T>,
    {
        let mut guard = self.conn.lock().map_err(|_| StorageError::LockPoisoned {
            which: "write connection".to_string(),
        })?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| to_storage_err(format!("begin immediate transaction: {e}")))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| to_storage_err(format!("commit: {e}")))?;
        Ok(result)
    }
}
