use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{Error, Result};

use super::upstream_err;

/// One OSM element from an Overpass result set.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OsmElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<Center>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

impl OsmElement {
    /// Nodes carry their own position; ways and relations rely on the
    /// `out center` clause of the query.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => self.center.map(|c| (c.lat, c.lon)),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.tags
            .get("name")
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Deserialize)]
struct OverpassBody {
    #[serde(default)]
    elements: Vec<OsmElement>,
    // Overpass reports runtime problems inside a 200 body.
    #[serde(default)]
    remark: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Port for the geographic-data upstream; `OverpassService` memoizes it.
#[async_trait]
pub trait OverpassApi: Send + Sync + 'static {
    async fn query(&self, ql: &str) -> Result<Vec<OsmElement>>;
}

pub struct OverpassClient {
    http: reqwest::Client,
    url: String,
}

impl OverpassClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("building overpass client: {e}")))?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl OverpassApi for OverpassClient {
    async fn query(&self, ql: &str) -> Result<Vec<OsmElement>> {
        let body: OverpassBody = self
            .http
            .post(&self.url)
            .form(&[("data", ql)])
            .send()
            .await
            .map_err(upstream_err)?
            .error_for_status()
            .map_err(upstream_err)?
            .json()
            .await
            .map_err(upstream_err)?;

        if let Some(remark) = body.remark {
            return Err(Error::Upstream(format!("overpass remark: {remark}")));
        }
        if let Some(error) = body.error {
            return Err(Error::Upstream(format!("overpass error: {error}")));
        }
        Ok(body.elements)
    }
}

/// Query for the main OSM skatepark tagging: leisure=pitch + sport=skateboard.
pub fn pitch_skateboard_query(lat: f64, lon: f64, radius_m: u32) -> String {
    format!(
        "[out:json][timeout:25];\
         nwr[\"leisure\"=\"pitch\"][\"sport\"=\"skateboard\"](around:{radius_m},{lat},{lon});\
         out center;"
    )
}

/// Query for leisure=<value> variants (skate_park, skatepark).
pub fn leisure_query(lat: f64, lon: f64, radius_m: u32, leisure_value: &str) -> String {
    format!(
        "[out:json][timeout:25];\
         nwr[\"leisure\"=\"{leisure_value}\"](around:{radius_m},{lat},{lon});\
         out center;"
    )
}
