//! Current weather observation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single current-conditions reading from the weather source, in imperial units
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherObservation {
    /// When the provider took the measurement
    pub timestamp: DateTime<Utc>,
    /// Ambient temperature in Fahrenheit
    pub temperature_f: f64,
    /// Apparent temperature in Fahrenheit
    pub feels_like_f: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in miles per hour
    pub wind_speed_mph: f64,
    /// Short condition code (e.g. "Clear", "Rain")
    pub condition: String,
    /// Human-readable description of conditions
    pub description: String,
    /// Cloud cover percentage (0-100)
    pub cloud_coverage: u8,
    /// Visibility in miles
    pub visibility_miles: f64,
    /// Atmospheric pressure in hPa
    pub pressure_hpa: u16,
}

impl WeatherObservation {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.0}°F", self.temperature_f)
    }

    /// Format wind speed with unit
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.0} mph", self.wind_speed_mph)
    }

    /// One-line digest used in briefings, e.g. `72°F, scattered clouds`
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}, {}", self.format_temperature(), self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_summary() {
        let weather = WeatherObservation {
            timestamp: Utc::now(),
            temperature_f: 71.6,
            feels_like_f: 70.2,
            humidity: 40,
            wind_speed_mph: 8.4,
            condition: "Clouds".to_string(),
            description: "scattered clouds".to_string(),
            cloud_coverage: 40,
            visibility_miles: 6.2,
            pressure_hpa: 1015,
        };
        assert_eq!(weather.summary(), "72°F, scattered clouds");
        assert_eq!(weather.format_wind(), "8 mph");
    }
}
