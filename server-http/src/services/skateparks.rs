use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use shared::Result;
use spotcache::{normalize_city, round_coord, CacheOutcome};
use tracing::debug;

use crate::clients::overpass::{leisure_query, pitch_skateboard_query};
use crate::services::{GeocodingService, OverpassService};

/// Nominatim's usage policy caps reverse geocoding at one request per
/// second; applied only after uncached lookups.
const REVERSE_GEOCODE_PACE: Duration = Duration::from_millis(1100);

#[derive(Clone, Debug)]
pub struct Skatepark {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SearchSummary {
    pub city: String,
    pub address: String,
    pub center: (f64, f64),
    pub radius_m: u32,
    pub parks: Vec<Skatepark>,
}

/// Orchestrates geocoding + Overpass: one city in, every named skatepark
/// within the radius out.
pub struct SkateparkService {
    geocoding: Arc<GeocodingService>,
    overpass: Arc<OverpassService>,
    radius_m: u32,
}

impl SkateparkService {
    pub fn new(
        geocoding: Arc<GeocodingService>,
        overpass: Arc<OverpassService>,
        radius_m: u32,
    ) -> Self {
        Self {
            geocoding,
            overpass,
            radius_m,
        }
    }

    /// Finds all named skate parks within the configured radius of the city
    /// center. With `resolve_address`, parks whose OSM tags carry no address
    /// get one from reverse geocoding (the first uncached pass is slow on
    /// purpose, ~1s per park).
    pub async fn find_by_city(&self, city: &str, resolve_address: bool) -> Result<SearchSummary> {
        let center = self.geocoding.geocode_city(city).await?;

        // Skateparks are tagged three different ways in OSM; query all
        // variants concurrently and merge.
        let base_params = [
            ("city", normalize_city(city)),
            ("lat", round_coord(center.lat, 6)),
            ("lon", round_coord(center.lon, 6)),
            ("radius_m", self.radius_m.to_string()),
        ];
        let tagged_queries = [
            (
                pitch_skateboard_query(center.lat, center.lon, self.radius_m),
                "leisure=pitch;sport=skateboard",
            ),
            (
                leisure_query(center.lat, center.lon, self.radius_m, "skate_park"),
                "leisure=skate_park",
            ),
            (
                leisure_query(center.lat, center.lon, self.radius_m, "skatepark"),
                "leisure=skatepark",
            ),
        ];

        let results = try_join_all(tagged_queries.into_iter().map(|(ql, tag)| {
            let mut params = base_params.to_vec();
            params.push(("tag", tag.to_string()));
            async move { self.overpass.query(ql, &params).await }
        }))
        .await?;

        let mut seen = HashSet::new();
        let mut parks = Vec::new();
        for element in results.into_iter().flatten() {
            if !seen.insert((element.kind.clone(), element.id)) {
                continue;
            }
            // Unnamed pitches are mostly mapping noise; skip them.
            let Some(name) = element.name() else { continue };
            let Some((lat, lon)) = element.position() else { continue };
            parks.push(Skatepark {
                name: name.to_string(),
                lat: round6(lat),
                lon: round6(lon),
                address: display_address(&element.tags),
            });
        }
        debug!("city={}: {} skateparks after merge", city, parks.len());

        if resolve_address {
            self.resolve_missing_addresses(&mut parks).await?;
        }

        Ok(SearchSummary {
            city: city.trim().to_string(),
            address: center.display_name,
            center: (center.lat, center.lon),
            radius_m: self.radius_m,
            parks,
        })
    }

    async fn resolve_missing_addresses(&self, parks: &mut [Skatepark]) -> Result<()> {
        for park in parks.iter_mut().filter(|p| p.address.is_none()) {
            let (address, origin) = self.geocoding.reverse_geocode(park.lat, park.lon).await?;
            if address.is_some() {
                park.address = address;
            }
            if origin == CacheOutcome::Miss {
                tokio::time::sleep(REVERSE_GEOCODE_PACE).await;
            }
        }
        Ok(())
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Builds a readable address from OSM `addr:*` tags; `None` when the
/// element carries no address tags at all.
fn display_address(tags: &HashMap<String, String>) -> Option<String> {
    let get = |key: &str| {
        tags.get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    };

    // addr:full is often present as a complete string.
    if let Some(full) = get("addr:full").or_else(|| get("address")) {
        return Some(full.to_string());
    }

    let city = get("addr:city")
        .or_else(|| get("addr:town"))
        .or_else(|| get("addr:village"))
        .or_else(|| get("addr:municipality"));

    let mut parts = Vec::new();
    if let Some(street) = get("addr:street") {
        let mut line = street.to_string();
        if let Some(housenumber) = get("addr:housenumber") {
            line.push(' ');
            line.push_str(housenumber);
        }
        if let Some(unit) = get("addr:unit") {
            line.push_str(", ");
            line.push_str(unit);
        }
        parts.push(line);
    } else if let Some(housenumber) = get("addr:housenumber") {
        parts.push(housenumber.to_string());
    }
    for key in [city, get("addr:postcode"), get("addr:country")] {
        if let Some(value) = key {
            parts.push(value.to_string());
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
