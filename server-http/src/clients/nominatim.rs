use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shared::{Error, Result};

use super::upstream_err;

/// City center with the address Nominatim resolved for it.
#[derive(Clone, Debug, PartialEq)]
pub struct GeocodedCity {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

/// Port for the geocoding upstream. `GeocodingService` memoizes calls to
/// this; tests substitute a stub.
#[async_trait]
pub trait Geocoder: Send + Sync + 'static {
    /// City name to coordinates. An unknown city is `Error::NotFound`.
    async fn geocode(&self, city: &str) -> Result<GeocodedCity>;

    /// Coordinates to a postal address, `None` when Nominatim has nothing
    /// at that position.
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>>;
}

// Nominatim serializes coordinates as strings.
#[derive(Deserialize)]
struct SearchPlace {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Deserialize)]
struct ReversePlace {
    #[serde(default)]
    display_name: Option<String>,
}

pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// `user_agent` is mandatory identification: Nominatim blocks anonymous
    /// clients.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("building nominatim client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, city: &str) -> Result<GeocodedCity> {
        let places: Vec<SearchPlace> = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", city),
                ("format", "jsonv2"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(upstream_err)?
            .error_for_status()
            .map_err(upstream_err)?
            .json()
            .await
            .map_err(upstream_err)?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("could not find location: {city}")))?;

        let lat = parse_coord(&place.lat)?;
        let lon = parse_coord(&place.lon)?;
        Ok(GeocodedCity {
            lat,
            lon,
            display_name: place.display_name,
        })
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        // A position with no address comes back as 200 with an "error"
        // field and no display_name.
        let place: ReversePlace = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await
            .map_err(upstream_err)?
            .error_for_status()
            .map_err(upstream_err)?
            .json()
            .await
            .map_err(upstream_err)?;

        Ok(place.display_name)
    }
}

fn parse_coord(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| Error::Upstream(format!("nominatim returned unparseable coordinate '{raw}'")))
}
