use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The worst pollutant reading reported near the briefing location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQualityObservation {
    pub timestamp: DateTime<Utc>,
    /// AQI-equivalent index of the primary pollutant; higher is worse
    pub aqi: u32,
    /// Pollutant name (e.g. "PM2.5", "O3")
    pub pollutant: String,
    /// Category label (e.g. "Moderate")
    pub category: String,
    pub reporting_area: String,
}

impl AirQualityObservation {
    /// One-line digest used in briefings, e.g. `AQI 42 (Good)`
    #[must_use]
    pub fn summary(&self) -> String {
        format!("AQI {} ({})", self.aqi, self.category)
    }
}
