pub mod nominatim;
pub mod overpass;

pub use nominatim::{GeocodedCity, Geocoder, NominatimClient};
pub use overpass::{OsmElement, OverpassApi, OverpassClient};

pub(crate) fn upstream_err(e: reqwest::Error) -> shared::Error {
    shared::Error::Upstream(e.to_string())
}
