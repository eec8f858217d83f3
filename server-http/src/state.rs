use std::sync::Arc;

use shared::config::Config;
use shared::Result;
use spotcache::{Sweeper, SweeperHandle};

use crate::clients::{GeocodedCity, NominatimClient, OsmElement, OverpassClient};
use crate::services::{GeocodingService, OverpassService, SkateparkService};

/// Server state shared across handlers. Built once at startup; the services
/// and their caches live for the whole process.
#[derive(Clone)]
pub struct AppState {
    pub geocoding: Arc<GeocodingService>,
    pub overpass: Arc<OverpassService>,
    pub skateparks: Arc<SkateparkService>,
}

impl AppState {
    /// Wires clients, stores, services, and the expiry sweeper. The caller
    /// keeps the [`SweeperHandle`] and shuts it down at process teardown.
    pub fn new(config: &Config) -> Result<(Self, SweeperHandle)> {
        let nominatim = Arc::new(NominatimClient::new(
            &config.nominatim_url,
            &config.nominatim_user_agent,
            config.nominatim_timeout,
        )?);
        let overpass_client = Arc::new(OverpassClient::new(
            &config.overpass_url,
            config.overpass_timeout,
        )?);

        let (geocode_store, geocode_sweep) =
            storage_engine::build_store::<GeocodedCity>(config.cache_backend);
        let (reverse_store, reverse_sweep) =
            storage_engine::build_store::<String>(config.cache_backend);
        let (overpass_store, overpass_sweep) =
            storage_engine::build_store::<Vec<OsmElement>>(config.cache_backend);

        let sweeper = Sweeper::spawn(
            vec![geocode_sweep, reverse_sweep, overpass_sweep],
            config.sweep_interval,
        );

        let geocoding = Arc::new(GeocodingService::new(
            nominatim,
            geocode_store,
            reverse_store,
            config.geocode_ttl,
        ));
        let overpass = Arc::new(OverpassService::new(
            overpass_client,
            overpass_store,
            config.overpass_ttl,
        ));
        let skateparks = Arc::new(SkateparkService::new(
            Arc::clone(&geocoding),
            Arc::clone(&overpass),
            config.city_radius_m,
        ));

        Ok((
            Self {
                geocoding,
                overpass,
                skateparks,
            },
            sweeper,
        ))
    }
}
