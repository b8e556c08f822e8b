//! Integration tests for HealthGuard

use async_trait::async_trait;
use chrono::Utc;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

use healthguard::scoring::Priority;
use healthguard::{
    AirQualityObservation, AirQualitySource, BriefingContext, BriefingHistory, BriefingType,
    HealthGuardian, HistoryStats, Location, NarrativeDrafter, NarrativeError, Phase, RiskLevel,
    SourceError, WeatherObservation, WeatherSource,
};

struct StaticWeather(WeatherObservation);

#[async_trait]
impl WeatherSource for StaticWeather {
    async fn get_current_weather(
        &self,
        _location: &Location,
    ) -> Result<Option<WeatherObservation>, SourceError> {
        Ok(Some(self.0.clone()))
    }
}

struct StaticAir(u32);

#[async_trait]
impl AirQualitySource for StaticAir {
    async fn get_current_aqi(
        &self,
        _location: &Location,
    ) -> Result<Option<AirQualityObservation>, SourceError> {
        Ok(Some(AirQualityObservation {
            timestamp: Utc::now(),
            aqi: self.0,
            pollutant: "PM2.5".to_string(),
            category: "Unhealthy".to_string(),
            reporting_area: "Boston".to_string(),
        }))
    }
}

struct EchoDrafter;

#[async_trait]
impl NarrativeDrafter for EchoDrafter {
    async fn draft(&self, context: &BriefingContext) -> Result<String, NarrativeError> {
        Ok(format!("{}: {}", context.location, context.briefing_type))
    }
}

fn hot_weather() -> WeatherObservation {
    WeatherObservation {
        timestamp: Utc::now(),
        temperature_f: 99.0,
        feels_like_f: 104.0,
        humidity: 70,
        wind_speed_mph: 4.0,
        condition: "Haze".to_string(),
        description: "haze".to_string(),
        cloud_coverage: 20,
        visibility_miles: 2.0,
        pressure_hpa: 1009,
    }
}

fn guardian(aqi: u32) -> HealthGuardian {
    HealthGuardian::new(
        Location::new(42.3601, -71.0589, "Boston, MA"),
        Arc::new(StaticWeather(hot_weather())),
        Arc::new(StaticAir(aqi)),
        Arc::new(EchoDrafter),
    )
}

/// Smoky heat wave: every factor contributes and the score is very high
#[tokio::test]
async fn test_heat_wave_run_end_to_end() {
    let state = guardian(180).run().await.unwrap();

    // AQI 92, temperature 90, wind 4, visibility 40
    let expected = (92.0 * 0.35 + 90.0 * 0.25 + 4.0 * 0.10 + 40.0 * 0.15) / 0.85;
    assert!((state.risk_score - expected).abs() < 1e-9);
    assert_eq!(state.risk_level, Some(RiskLevel::VeryHigh));
    assert_eq!(state.phase, Phase::Complete);
    assert!(state.trend_check_needed);
    assert!(state.trend_alert);
    assert_eq!(state.briefing_type, BriefingType::HighRisk);
    assert_eq!(state.briefing_text, "Boston, MA: high_risk");
    assert!(state.primary_concerns.iter().any(|c| c.contains("AQI")));
    assert!(state.primary_concerns.iter().any(|c| c.contains("heat")));

    let plan = state.action_plan.as_ref().unwrap();
    assert_eq!(plan.actions.len(), 1);
    assert_eq!(plan.actions[0].priority, Priority::Critical);
    assert!(!plan.outdoor_exercise_safe);
    assert!(plan.summary.starts_with("🔴"));
}

#[tokio::test]
async fn test_runs_are_saved_and_aggregated() {
    let dir = TempDir::new().unwrap();
    let history = BriefingHistory::new(dir.path());

    let mut saved_scores = Vec::new();
    for (offset, aqi) in [(2, 20), (1, 180)] {
        let mut state = guardian(aqi).run().await.unwrap();
        state.timestamp = Utc::now() - chrono::Duration::hours(offset);
        history.save(&state).unwrap();
        saved_scores.push(state.risk_score);
    }

    let records = history.get_recent(7).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].timestamp > records[1].timestamp);
    assert_eq!(records[0].risk_level, "very_high");

    let stats = HistoryStats::from_records(&records);
    let average = saved_scores.iter().sum::<f64>() / 2.0;
    assert_eq!(stats.count, 2);
    assert!((stats.average_score.unwrap() - average).abs() < 1e-9);
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_healthguard"))
        .arg("--help")
        .output()
        .expect("Failed to execute healthguard");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Daily environmental health briefings"));
    for command in ["run", "history", "status", "serve"] {
        assert!(stdout.contains(command), "missing subcommand {command}");
    }
}
