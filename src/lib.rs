//! `HealthGuard` - Daily environmental health briefings
//!
//! This library fetches current weather and air quality for a city, scores
//! the combined health risk, plans prioritized actions and drafts a short
//! briefing.

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod models;
pub mod narrative;
pub mod retry;
pub mod scoring;
pub mod sources;
pub mod web;
pub mod workflow;

// Re-export core types for public API
pub use config::HealthGuardConfig;
pub use error::HealthGuardError;
pub use history::{BriefingHistory, BriefingRecord, HistoryStats};
pub use models::{AirQualityObservation, Location, WeatherObservation};
pub use narrative::{BriefingContext, BriefingType, NarrativeDrafter, NarrativeError};
pub use scoring::{ActionPlan, ActionPlanner, RiskAssessment, RiskCalculator, RiskLevel};
pub use sources::{AirQualitySource, SourceError, WeatherSource};
pub use workflow::{HealthGuardian, Phase, RunState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, HealthGuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
