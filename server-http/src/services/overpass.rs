use std::sync::Arc;
use std::time::Duration;

use shared::Result;
use spotcache::{CacheStats, CacheStore, MemoCache, RequestKind};

use crate::clients::{OsmElement, OverpassApi};

/// Memoized Overpass queries. Overpass is the slowest and most rate-limited
/// upstream, so every distinct (area, tag) query is cached and concurrent
/// duplicates collapse into one call.
pub struct OverpassService {
    api: Arc<dyn OverpassApi>,
    cache: MemoCache<Vec<OsmElement>>,
    ttl: Duration,
}

impl OverpassService {
    pub fn new(
        api: Arc<dyn OverpassApi>,
        store: Arc<dyn CacheStore<Vec<OsmElement>>>,
        ttl: Duration,
    ) -> Self {
        Self {
            api,
            cache: MemoCache::new(store),
            ttl,
        }
    }

    /// Runs `ql` against Overpass. `key_params` identify the logical query
    /// (normalized city, rounded center, radius, tag selector) and must not
    /// embed the raw QL text.
    pub async fn query(&self, ql: String, key_params: &[(&str, String)]) -> Result<Vec<OsmElement>> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch_or_compute(RequestKind::Overpass, key_params, self.ttl, move || async move {
                api.query(&ql).await
            })
            .await
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
