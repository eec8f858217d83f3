use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Which cache-store backend to construct at startup.
///
/// Only the in-memory backend exists today; the enum is the configuration
/// side of the storage swap point (a networked store would be a new variant
/// here plus a new arm in `storage-engine::build_store`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            other => Err(format!("unsupported cache backend '{other}'")),
        }
    }
}

pub struct Config {
    pub host: String,
    pub port: u16,

    // Required identification for Nominatim (avoid being blocked)
    pub nominatim_url: String,
    pub nominatim_user_agent: String,
    pub nominatim_timeout: Duration,

    pub overpass_url: String,
    pub overpass_timeout: Duration,

    // Radius used for "all skate parks in city" (no user choice)
    pub city_radius_m: u32,

    // Per-request-kind cache TTLs; reverse geocoding shares the geocode TTL
    pub geocode_ttl: Duration,
    pub overpass_ttl: Duration,

    pub sweep_interval: Duration,
    pub cache_backend: CacheBackend,
}

impl Config {
    const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
    const DEFAULT_NOMINATIM_USER_AGENT: &str =
        "skatespot_api/0.1 (contact: dev@yourdomain.com)";
    const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
    const DEFAULT_CITY_RADIUS_M: u32 = 50_000; // 50 km from city center
    const DEFAULT_GEOCODE_TTL_SECS: u64 = 60 * 60 * 24 * 30; // 30 days
    const DEFAULT_OVERPASS_TTL_SECS: u64 = 60 * 30; // 30 minutes
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

    pub fn from_env() -> Self {
        let cache_backend = std::env::var("SKATESPOT_CACHE_BACKEND")
            .map(|raw| match raw.parse::<CacheBackend>() {
                Ok(backend) => backend,
                Err(e) => {
                    warn!("SKATESPOT_CACHE_BACKEND: {}, falling back to 'memory'", e);
                    CacheBackend::Memory
                }
            })
            .unwrap_or(CacheBackend::Memory);

        Self {
            host: env_string("SKATESPOT_HOST", "0.0.0.0"),
            port: env_parsed("SKATESPOT_PORT", 8080),
            nominatim_url: env_string("SKATESPOT_NOMINATIM_URL", Self::DEFAULT_NOMINATIM_URL),
            nominatim_user_agent: env_string(
                "SKATESPOT_NOMINATIM_USER_AGENT",
                Self::DEFAULT_NOMINATIM_USER_AGENT,
            ),
            nominatim_timeout: Duration::from_secs(env_parsed(
                "SKATESPOT_NOMINATIM_TIMEOUT_SECS",
                10,
            )),
            overpass_url: env_string("SKATESPOT_OVERPASS_URL", Self::DEFAULT_OVERPASS_URL),
            overpass_timeout: Duration::from_secs(env_parsed(
                "SKATESPOT_OVERPASS_TIMEOUT_SECS",
                35,
            )),
            city_radius_m: env_parsed("SKATESPOT_CITY_RADIUS_M", Self::DEFAULT_CITY_RADIUS_M),
            geocode_ttl: Duration::from_secs(env_parsed(
                "SKATESPOT_GEOCODE_TTL_SECS",
                Self::DEFAULT_GEOCODE_TTL_SECS,
            )),
            overpass_ttl: Duration::from_secs(env_parsed(
                "SKATESPOT_OVERPASS_TTL_SECS",
                Self::DEFAULT_OVERPASS_TTL_SECS,
            )),
            sweep_interval: Duration::from_secs(env_parsed(
                "SKATESPOT_SWEEP_INTERVAL_SECS",
                Self::DEFAULT_SWEEP_INTERVAL_SECS,
            )),
            cache_backend,
        }
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: FromStr + Copy>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("{} has an unparseable value '{}', using default", name, raw);
                None
            }
        })
        .unwrap_or(default)
}
