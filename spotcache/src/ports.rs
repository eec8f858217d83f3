use std::time::Duration;

use async_trait::async_trait;
use shared::Result;

use crate::fingerprint::CacheKey;

// Ports are the pluggable extension points for cache storage. The in-memory
// backend lives in `storage-engine`; a networked store only has to implement
// `CacheStore` and preserve the liveness rule below. Callers never see the
// difference.

/// Port for a TTL'd key/value store.
///
/// Liveness rule: an entry is live iff `now < stored_at + ttl`. A dead entry
/// is indistinguishable from an absent one; implementations may purge it
/// lazily on read instead of eagerly.
#[async_trait]
pub trait CacheStore<V>: Send + Sync + 'static
where
    V: Clone + Send + Sync + 'static,
{
    /// Returns `None` for both "never stored" and "expired".
    async fn get(&self, key: &CacheKey) -> Result<Option<V>>;

    /// Inserts or overwrites. A zero `ttl` is rejected with
    /// [`shared::Error::InvalidTtl`] and nothing is stored.
    async fn put(&self, key: CacheKey, val: V, ttl: Duration) -> Result<()>;

    /// Removes every dead entry, returning how many were dropped.
    async fn delete_expired(&self) -> Result<usize>;
}

/// Object-safe sweep handle so stores holding different value types can be
/// driven by one [`crate::Sweeper`].
#[async_trait]
pub trait Sweepable: Send + Sync + 'static {
    async fn delete_expired(&self) -> Result<usize>;
}
