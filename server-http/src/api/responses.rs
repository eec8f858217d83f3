use serde::Serialize;
use spotcache::CacheStats;

use crate::services::{SearchSummary, Skatepark};

#[derive(Debug, Serialize)]
pub struct SkateparkDto {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
}

impl From<Skatepark> for SkateparkDto {
    fn from(park: Skatepark) -> Self {
        Self {
            name: park.name,
            lat: park.lat,
            lon: park.lon,
            address: park.address,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CenterDto {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct SearchMetadataDto {
    pub city: String,
    pub address: String,
    pub center: CenterDto,
    pub radius_m: u32,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub skateparks: Vec<SkateparkDto>,
    pub metadata: SearchMetadataDto,
}

impl From<SearchSummary> for SearchResponse {
    fn from(summary: SearchSummary) -> Self {
        let total = summary.parks.len();
        Self {
            skateparks: summary.parks.into_iter().map(SkateparkDto::from).collect(),
            metadata: SearchMetadataDto {
                city: summary.city,
                address: summary.address,
                center: CenterDto {
                    lat: summary.center.0,
                    lon: summary.center.1,
                },
                radius_m: summary.radius_m,
                total,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheCountersDto {
    pub hits: u64,
    pub misses: u64,
}

impl From<CacheStats> for CacheCountersDto {
    fn from(stats: CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthCachesDto {
    pub geocode: CacheCountersDto,
    pub reverse: CacheCountersDto,
    pub overpass: CacheCountersDto,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub caches: HealthCachesDto,
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
