//! Location model for the briefing city

use serde::{Deserialize, Serialize};

/// Location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Display name (e.g. "Boston, MA")
    pub name: String,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            name: name.into(),
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Whether both coordinates are inside their valid ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.format_coordinates())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_format_coordinates() {
        let location = Location::new(42.360_123, -71.058_912, "Boston, MA");
        assert_eq!(location.format_coordinates(), "42.3601, -71.0589");
        assert_eq!(location.to_string(), "Boston, MA (42.3601, -71.0589)");
    }

    #[test]
    fn test_location_validity() {
        assert!(Location::new(42.36, -71.06, "Boston").is_valid());
        assert!(!Location::new(91.0, 0.0, "Nowhere").is_valid());
        assert!(!Location::new(0.0, -181.0, "Nowhere").is_valid());
    }
}
