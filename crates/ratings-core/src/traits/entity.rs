use crate::errors::RatingsResult;
use crate::models::Aggregate;

/// Resolves entity ids of one registered type tag to the host's records.
///
/// The host keeps a denormalized `(score, votes)` pair per rating attribute on
/// its own records; `store_cached` is called with the fresh aggregate inside
/// the same unit of work as the vote write, so an error here rolls the vote
/// back.
pub trait EntityResolver: Send + Sync {
    /// Whether an entity with this id exists.
    fn exists(&self, entity_id: i64) -> RatingsResult<bool>;

    /// Persist the cached aggregate on the host entity. Hosts that keep no
    /// cached fields can rely on the default no-op.
    ///
    /// Runs while the storage write lock is held. Implementations must not
    /// call back into the same rating storage (submit, purge or any read
    /// routed through the writer); the lock is not reentrant and the call
    /// deadlocks. Keep cached fields in the host's own store.
    fn store_cached(&self, _aggregate: &Aggregate) -> RatingsResult<()> {
        Ok(())
    }
}
