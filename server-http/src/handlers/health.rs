use axum::extract::State;
use axum::Json;

use crate::api::responses::{HealthCachesDto, HealthResponse};
use crate::state::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "OK".into(),
        caches: HealthCachesDto {
            geocode: state.geocoding.geocode_stats().into(),
            reverse: state.geocoding.reverse_stats().into(),
            overpass: state.overpass.stats().into(),
        },
    })
}
