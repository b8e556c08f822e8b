//! Data models for the HealthGuard application
//!
//! - Location: the city the briefing is produced for
//! - Weather: current conditions from the weather source
//! - Air quality: primary pollutant reading from the air-quality source

pub mod air_quality;
pub mod location;
pub mod weather;

pub use air_quality::AirQualityObservation;
pub use location::Location;
pub use weather::WeatherObservation;
