use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shared::Result;

use crate::fingerprint::{fingerprint, RequestKind};
use crate::ports::CacheStore;
use crate::singleflight::SingleFlight;

/// Hit/miss counters for the health surface. Not load-bearing.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Whether a value came out of the store or had to be fetched. Callers
/// pacing their upstream traffic (Nominatim's one-request-per-second rule)
/// only throttle after `Miss`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

/// The memoizing façade: fingerprint + store + single-flight composed behind
/// one call. This is the only cache surface the lookup services use.
///
/// One long-lived instance per request kind is built at startup and shared
/// through the app state; there is no hidden global.
pub struct MemoCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    store: Arc<dyn CacheStore<V>>,
    flights: SingleFlight<V>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> MemoCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<dyn CacheStore<V>>) -> Self {
        Self {
            store,
            flights: SingleFlight::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached value for the fingerprinted request, or runs
    /// `fetch` at most once across all concurrent callers and caches its
    /// result for `ttl`. Errors from `fetch` are returned to every caller of
    /// this flight and never cached; there are no retries at this layer.
    pub async fn fetch_or_compute<F, Fut>(
        &self,
        kind: RequestKind,
        params: &[(&str, String)],
        ttl: Duration,
        fetch: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        self.fetch_or_compute_traced(kind, params, ttl, fetch)
            .await
            .map(|(value, _)| value)
    }

    /// Like [`fetch_or_compute`](Self::fetch_or_compute) but also reports
    /// whether the value was served from the store. Waiters that rode an
    /// in-flight fetch count as `Miss`: they paid upstream latency.
    pub async fn fetch_or_compute_traced<F, Fut>(
        &self,
        kind: RequestKind,
        params: &[(&str, String)],
        ttl: Duration,
        fetch: F,
    ) -> Result<(V, CacheOutcome)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let key = fingerprint(kind, params);

        if let Some(value) = self.store.get(&key).await? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((value, CacheOutcome::Hit));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let store = Arc::clone(&self.store);
        let flight_key = key.clone();
        let value = self
            .flights
            .run(&key, move || async move {
                let value = fetch().await?;
                // Populate before the in-flight record is released so late
                // arrivals hit the cache instead of starting a new fetch.
                store.put(flight_key, value.clone(), ttl).await?;
                Ok(value)
            })
            .await?;
        Ok((value, CacheOutcome::Miss))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{normalize_city, CacheKey};
    use async_trait::async_trait;
    use shared::Error;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;
    use tokio::sync::Mutex;
    use tokio::time::sleep;

    /// Minimal port implementation for exercising the façade without
    /// pulling in a backend crate.
    struct MapStore<V> {
        entries: Mutex<HashMap<CacheKey, (V, Instant)>>,
    }

    impl<V> MapStore<V> {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl<V> CacheStore<V> for MapStore<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        async fn get(&self, key: &CacheKey) -> Result<Option<V>> {
            let entries = self.entries.lock().await;
            Ok(entries
                .get(key)
                .filter(|(_, expires_at)| Instant::now() < *expires_at)
                .map(|(value, _)| value.clone()))
        }

        async fn put(&self, key: CacheKey, val: V, ttl: Duration) -> Result<()> {
            if ttl.is_zero() {
                return Err(Error::InvalidTtl(ttl));
            }
            let mut entries = self.entries.lock().await;
            entries.insert(key, (val, Instant::now() + ttl));
            Ok(())
        }

        async fn delete_expired(&self) -> Result<usize> {
            let mut entries = self.entries.lock().await;
            let before = entries.len();
            entries.retain(|_, (_, expires_at)| Instant::now() < *expires_at);
            Ok(before - entries.len())
        }
    }

    fn city_params(raw: &str) -> [(&'static str, String); 1] {
        [("city", normalize_city(raw))]
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let cache = MemoCache::new(Arc::new(MapStore::<(f64, f64)>::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let coords = cache
                .fetch_or_compute(
                    RequestKind::Geocode,
                    &city_params("Lisbon"),
                    Duration::from_secs(3600),
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok((38.7, -9.1))
                    },
                )
                .await
                .unwrap();
            assert_eq!(coords, (38.7, -9.1));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn normalized_variants_share_the_cached_value() {
        let cache = MemoCache::new(Arc::new(MapStore::<u32>::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        for raw in ["  Lisbon ", "lisbon", "LISBON"] {
            let calls = Arc::clone(&calls);
            cache
                .fetch_or_compute(
                    RequestKind::Geocode,
                    &city_params(raw),
                    Duration::from_secs(60),
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(9)
                    },
                )
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entries_trigger_a_refetch() {
        let cache = MemoCache::new(Arc::new(MapStore::<u32>::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }
        };

        cache
            .fetch_or_compute(
                RequestKind::Geocode,
                &city_params("porto"),
                Duration::from_millis(100),
                fetch(Arc::clone(&calls)),
            )
            .await
            .unwrap();
        sleep(Duration::from_millis(150)).await;
        cache
            .fetch_or_compute(
                RequestKind::Geocode,
                &city_params("porto"),
                Duration::from_millis(100),
                fetch(Arc::clone(&calls)),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn ten_concurrent_misses_cost_one_fetch() {
        let cache = Arc::new(MemoCache::new(Arc::new(MapStore::<u32>::new())));
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tasks.push(tokio::spawn(async move {
                cache
                    .fetch_or_compute(
                        RequestKind::Geocode,
                        &city_params("Porto"),
                        Duration::from_secs(60),
                        move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            sleep(Duration::from_millis(200)).await;
                            Ok(11)
                        },
                    )
                    .await
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 11);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn failed_fetches_are_not_cached() {
        let cache = MemoCache::new(Arc::new(MapStore::<u32>::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        let calls1 = Arc::clone(&calls);
        let first = cache
            .fetch_or_compute(
                RequestKind::Overpass,
                &city_params("porto"),
                Duration::from_secs(60),
                move || async move {
                    calls1.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(Error::Upstream("overpass 504".into()))
                },
            )
            .await;
        assert!(matches!(first, Err(Error::Upstream(_))));

        let calls2 = Arc::clone(&calls);
        let second = cache
            .fetch_or_compute(
                RequestKind::Overpass,
                &city_params("porto"),
                Duration::from_secs(60),
                move || async move {
                    calls2.fetch_add(1, Ordering::SeqCst);
                    Ok(5)
                },
            )
            .await;
        assert_eq!(second, Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
