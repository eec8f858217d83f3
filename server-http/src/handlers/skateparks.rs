use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::api::responses::SearchResponse;
use crate::error::ApiError;
use crate::state::AppState;

fn default_resolve_address() -> bool {
    true
}

#[derive(Deserialize)]
pub struct ByCityParams {
    pub city: String,
    /// Resolve addresses via reverse geocoding when OSM has none. The first
    /// uncached request is slower (~1s per park); after that it is cached.
    #[serde(default = "default_resolve_address")]
    pub resolve_address: bool,
}

/// GET /skateparks/by-city?city=<name>&resolve_address=<bool>
pub async fn by_city(
    State(state): State<AppState>,
    Query(params): Query<ByCityParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let city = params.city.trim();
    if city.is_empty() {
        return Err(ApiError::EmptyCity);
    }
    info!(
        "search: city={}, resolve_address={}",
        city, params.resolve_address
    );

    let summary = state
        .skateparks
        .find_by_city(city, params.resolve_address)
        .await?;
    Ok(Json(summary.into()))
}
