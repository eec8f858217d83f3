use std::fmt::Debug;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use shared::{Error, Result};
use spotcache::{CacheKey, CacheStore, Sweepable};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process cache store: a concurrent map of per-entry TTL'd values.
///
/// Expired entries are treated as absent and purged lazily on read; the
/// sweeper calls `delete_expired` to keep a long-running process from
/// accumulating dead entries that nobody reads again.
pub struct MemoryStore<V> {
    entries: DashMap<CacheKey, Entry<V>>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> CacheStore<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<V>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.clone()));
            }
            // Dead entry: drop the shard guard before removing.
            drop(entry);
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(None)
    }

    async fn put(&self, key: CacheKey, val: V, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(Error::InvalidTtl(ttl));
        }
        self.entries.insert(
            key,
            Entry {
                value: val,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}

#[async_trait]
impl<V> Sweepable for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn delete_expired(&self) -> Result<usize> {
        CacheStore::delete_expired(self).await
    }
}

impl<V> Debug for MemoryStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}
