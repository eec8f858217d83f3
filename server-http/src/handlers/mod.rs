pub mod health;
pub mod skateparks;

pub use health::health_check;
pub use skateparks::by_city;
