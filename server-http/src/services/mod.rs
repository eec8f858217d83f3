pub mod geocoding;
pub mod overpass;
pub mod skateparks;

pub use geocoding::GeocodingService;
pub use overpass::OverpassService;
pub use skateparks::{SearchSummary, Skatepark, SkateparkService};
