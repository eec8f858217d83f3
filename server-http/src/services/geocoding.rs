use std::sync::Arc;
use std::time::Duration;

use shared::{Error, Result};
use spotcache::{
    normalize_city, round_coord, CacheOutcome, CacheStats, CacheStore, MemoCache, RequestKind,
};

use crate::clients::{GeocodedCity, Geocoder};

/// Memoized city and reverse geocoding.
///
/// Forward and reverse lookups go through separate façades (separate value
/// types, same TTL: geocoding results barely ever move).
pub struct GeocodingService {
    geocoder: Arc<dyn Geocoder>,
    geocode_cache: MemoCache<GeocodedCity>,
    reverse_cache: MemoCache<String>,
    ttl: Duration,
}

impl GeocodingService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        geocode_store: Arc<dyn CacheStore<GeocodedCity>>,
        reverse_store: Arc<dyn CacheStore<String>>,
        ttl: Duration,
    ) -> Self {
        Self {
            geocoder,
            geocode_cache: MemoCache::new(geocode_store),
            reverse_cache: MemoCache::new(reverse_store),
            ttl,
        }
    }

    /// City name to coordinates plus the resolved display address.
    pub async fn geocode_city(&self, city: &str) -> Result<GeocodedCity> {
        let params = [("city", normalize_city(city))];
        let geocoder = Arc::clone(&self.geocoder);
        let query = city.trim().to_string();
        self.geocode_cache
            .fetch_or_compute(RequestKind::Geocode, &params, self.ttl, move || async move {
                geocoder.geocode(&query).await
            })
            .await
    }

    /// Coordinates to a readable address, rounded to 5 decimals in the key
    /// so jittered positions dedupe. Returns the address (if any) and
    /// whether it came from the cache, so the caller can pace uncached
    /// Nominatim traffic.
    ///
    /// "No address here" is not cached: the façade never memoizes failures,
    /// and we deliberately route the absent case through one (no negative
    /// caching).
    pub async fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<(Option<String>, CacheOutcome)> {
        let params = [("lat", round_coord(lat, 5)), ("lon", round_coord(lon, 5))];
        let geocoder = Arc::clone(&self.geocoder);
        let outcome = self
            .reverse_cache
            .fetch_or_compute_traced(
                RequestKind::ReverseGeocode,
                &params,
                self.ttl,
                move || async move {
                    match geocoder.reverse(lat, lon).await? {
                        Some(address) => Ok(address),
                        None => Err(Error::NotFound(format!("no address at {lat}, {lon}"))),
                    }
                },
            )
            .await;

        match outcome {
            Ok((address, origin)) => Ok((Some(address), origin)),
            Err(Error::NotFound(_)) => Ok((None, CacheOutcome::Miss)),
            Err(e) => Err(e),
        }
    }

    pub fn geocode_stats(&self) -> CacheStats {
        self.geocode_cache.stats()
    }

    pub fn reverse_stats(&self) -> CacheStats {
        self.reverse_cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage_engine::MemoryStore;

    struct StubGeocoder {
        geocodes: AtomicUsize,
        reverses: AtomicUsize,
        reverse_result: Option<String>,
    }

    impl StubGeocoder {
        fn new(reverse_result: Option<String>) -> Self {
            Self {
                geocodes: AtomicUsize::new(0),
                reverses: AtomicUsize::new(0),
                reverse_result,
            }
        }
    }

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, city: &str) -> Result<GeocodedCity> {
            self.geocodes.fetch_add(1, Ordering::SeqCst);
            if city.eq_ignore_ascii_case("atlantis") {
                return Err(Error::NotFound(format!("could not find location: {city}")));
            }
            Ok(GeocodedCity {
                lat: 38.7,
                lon: -9.1,
                display_name: "Lisboa, Portugal".into(),
            })
        }

        async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Option<String>> {
            self.reverses.fetch_add(1, Ordering::SeqCst);
            Ok(self.reverse_result.clone())
        }
    }

    fn service(geocoder: Arc<StubGeocoder>) -> GeocodingService {
        GeocodingService::new(
            geocoder,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn city_variants_hit_the_upstream_once() {
        let geocoder = Arc::new(StubGeocoder::new(None));
        let service = service(Arc::clone(&geocoder));

        let first = service.geocode_city("  Lisbon ").await.unwrap();
        let second = service.geocode_city("LISBON").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(geocoder.geocodes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_city_is_not_cached() {
        let geocoder = Arc::new(StubGeocoder::new(None));
        let service = service(Arc::clone(&geocoder));

        for _ in 0..2 {
            let result = service.geocode_city("Atlantis").await;
            assert!(matches!(result, Err(Error::NotFound(_))));
        }
        // Both attempts reached the upstream: failures are never memoized.
        assert_eq!(geocoder.geocodes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reverse_hits_come_from_the_cache() {
        let geocoder = Arc::new(StubGeocoder::new(Some("Rua X, Lisboa".into())));
        let service = service(Arc::clone(&geocoder));

        let (addr, origin) = service.reverse_geocode(38.70000012, -9.1).await.unwrap();
        assert_eq!(addr.as_deref(), Some("Rua X, Lisboa"));
        assert_eq!(origin, CacheOutcome::Miss);

        // Jittered coordinates round to the same key.
        let (addr, origin) = service.reverse_geocode(38.700000, -9.1000004).await.unwrap();
        assert_eq!(addr.as_deref(), Some("Rua X, Lisboa"));
        assert_eq!(origin, CacheOutcome::Hit);

        assert_eq!(geocoder.reverses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absent_reverse_results_are_not_cached() {
        let geocoder = Arc::new(StubGeocoder::new(None));
        let service = service(Arc::clone(&geocoder));

        for _ in 0..2 {
            let (addr, origin) = service.reverse_geocode(0.0, 0.0).await.unwrap();
            assert_eq!(addr, None);
            assert_eq!(origin, CacheOutcome::Miss);
        }
        assert_eq!(geocoder.reverses.load(Ordering::SeqCst), 2);
    }
}
