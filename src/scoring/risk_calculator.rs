//! Composite Risk Scoring
//!
//! Combines whichever observations are available into a single weighted score,
//! a discrete risk level, a confidence label and a short list of concerns.
//! Absent sources drop their weighted term; nothing is ever fabricated.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{AirQualityObservation, WeatherObservation};

/// Maximum number of concern strings kept on an assessment
pub const MAX_CONCERNS: usize = 5;

/// Scoring factors and their fixed weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    AirQuality,
    Temperature,
    /// Reserved: no precipitation source exists yet, so it never contributes
    Precipitation,
    Wind,
    Visibility,
}

impl Factor {
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            Factor::AirQuality => 0.35,
            Factor::Temperature => 0.25,
            Factor::Precipitation => 0.15,
            Factor::Wind => 0.10,
            Factor::Visibility => 0.15,
        }
    }
}

/// Sub-score (0-100) contributed by one factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: Factor,
    pub score: f64,
}

/// Discrete risk level derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Step function with boundaries at 30, 50 and 70
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            RiskLevel::Low
        } else if score < 50.0 {
            RiskLevel::Moderate
        } else if score < 70.0 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reliability of an assessment, based on how many factors contributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// 0 factors: low, 1-2: medium, 3 or more: high
    #[must_use]
    pub fn from_factor_count(count: usize) -> Self {
        match count {
            0 => Confidence::Low,
            1 | 2 => Confidence::Medium,
            _ => Confidence::High,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a risk calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Weighted score, nominally 0-100
    pub overall_score: f64,
    pub risk_level: RiskLevel,
    pub confidence: Confidence,
    /// At most [`MAX_CONCERNS`] entries, air quality first
    pub primary_concerns: Vec<String>,
    /// Sub-scores that made up the overall score
    pub factors: Vec<FactorScore>,
}

/// Stateless risk calculator; safe to share between runs
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskCalculator;

impl RiskCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Score the available observations
    #[must_use]
    pub fn calculate(
        &self,
        weather: Option<&WeatherObservation>,
        air_quality: Option<&AirQualityObservation>,
    ) -> RiskAssessment {
        let mut factors = Vec::new();
        let mut concerns = Vec::new();

        if let Some(air_quality) = air_quality {
            let (score, concern) = score_air_quality(air_quality.aqi);
            factors.push(FactorScore {
                factor: Factor::AirQuality,
                score,
            });
            concerns.extend(concern);
        }

        if let Some(weather) = weather {
            let (score, concern) = score_temperature(weather.feels_like_f);
            factors.push(FactorScore {
                factor: Factor::Temperature,
                score,
            });
            concerns.extend(concern);

            let (score, concern) = score_wind(weather.wind_speed_mph);
            factors.push(FactorScore {
                factor: Factor::Wind,
                score,
            });
            concerns.extend(concern);

            let (score, concern) = score_visibility(weather.visibility_miles);
            factors.push(FactorScore {
                factor: Factor::Visibility,
                score,
            });
            concerns.extend(concern);
        }

        let overall_score = weighted_average(&factors);
        concerns.truncate(MAX_CONCERNS);

        RiskAssessment {
            overall_score,
            risk_level: RiskLevel::from_score(overall_score),
            confidence: Confidence::from_factor_count(factors.len()),
            primary_concerns: concerns,
            factors,
        }
    }
}

/// Weighted mean renormalised over the present factors only
fn weighted_average(factors: &[FactorScore]) -> f64 {
    let total_weight: f64 = factors.iter().map(|f| f.factor.weight()).sum();
    if factors.is_empty() || total_weight <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = factors.iter().map(|f| f.score * f.factor.weight()).sum();
    weighted / total_weight
}

fn score_air_quality(aqi: u32) -> (f64, Option<String>) {
    let value = f64::from(aqi);
    let (score, concern) = if aqi <= 50 {
        (value * 0.4, None)
    } else if aqi <= 100 {
        (20.0 + (value - 50.0) * 0.6, Some(format!("AQI moderate ({aqi})")))
    } else if aqi <= 150 {
        (
            50.0 + (value - 100.0) * 0.6,
            Some(format!("AQI unhealthy for sensitive groups ({aqi})")),
        )
    } else {
        (80.0 + (value - 150.0) * 0.4, Some(format!("AQI unhealthy ({aqi})")))
    };
    (score.min(100.0), concern)
}

fn score_temperature(feels_like_f: f64) -> (f64, Option<String>) {
    let (score, concern) = if feels_like_f < 20.0 {
        (70.0, Some(format!("Very cold ({feels_like_f:.0}°F)")))
    } else if feels_like_f < 32.0 {
        (50.0, Some(format!("Freezing ({feels_like_f:.0}°F)")))
    } else if feels_like_f > 100.0 {
        (90.0, Some(format!("Extreme heat ({feels_like_f:.0}°F)")))
    } else if feels_like_f > 90.0 {
        (60.0, Some(format!("Hot weather ({feels_like_f:.0}°F)")))
    } else if feels_like_f > 80.0 {
        (30.0, None)
    } else {
        ((feels_like_f - 70.0).abs() * 2.0, None)
    };
    (score.min(100.0), concern)
}

fn score_wind(wind_speed_mph: f64) -> (f64, Option<String>) {
    let (score, concern) = if wind_speed_mph > 30.0 {
        (60.0, Some(format!("High winds ({wind_speed_mph:.0} mph)")))
    } else if wind_speed_mph > 20.0 {
        (30.0, None)
    } else {
        (wind_speed_mph, None)
    };
    (score.min(100.0), concern)
}

fn score_visibility(visibility_miles: f64) -> (f64, Option<String>) {
    if visibility_miles < 1.0 {
        (70.0, Some(format!("Low visibility ({visibility_miles:.1} mi)")))
    } else if visibility_miles < 3.0 {
        (40.0, None)
    } else {
        (0.0, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn weather(feels_like_f: f64, wind_speed_mph: f64, visibility_miles: f64) -> WeatherObservation {
        WeatherObservation {
            timestamp: Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(),
            temperature_f: feels_like_f,
            feels_like_f,
            humidity: 50,
            wind_speed_mph,
            condition: "Clear".to_string(),
            description: "clear sky".to_string(),
            cloud_coverage: 0,
            visibility_miles,
            pressure_hpa: 1013,
        }
    }

    fn air_quality(aqi: u32) -> AirQualityObservation {
        AirQualityObservation {
            timestamp: Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(),
            aqi,
            pollutant: "PM2.5".to_string(),
            category: "Moderate".to_string(),
            reporting_area: "Boston".to_string(),
        }
    }

    #[test]
    fn test_no_observations_scores_zero() {
        let assessment = RiskCalculator::new().calculate(None, None);
        assert_eq!(assessment.overall_score, 0.0);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.confidence, Confidence::Low);
        assert!(assessment.primary_concerns.is_empty());
        assert!(assessment.factors.is_empty());
    }

    #[rstest]
    #[case(10.0, RiskLevel::Low)]
    #[case(25.0, RiskLevel::Low)]
    #[case(35.0, RiskLevel::Moderate)]
    #[case(45.0, RiskLevel::Moderate)]
    #[case(55.0, RiskLevel::High)]
    #[case(65.0, RiskLevel::High)]
    #[case(75.0, RiskLevel::VeryHigh)]
    #[case(95.0, RiskLevel::VeryHigh)]
    fn test_risk_level_steps(#[case] score: f64, #[case] expected: RiskLevel) {
        assert_eq!(RiskLevel::from_score(score), expected);
    }

    #[test]
    fn test_risk_level_boundaries() {
        assert_eq!(RiskLevel::from_score(29.99), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(50.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(70.0), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_score(250.0), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_single_factor_is_renormalised() {
        let aq = air_quality(120);
        let assessment = RiskCalculator::new().calculate(None, Some(&aq));
        assert!((assessment.overall_score - 62.0).abs() < 1e-9);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.confidence, Confidence::Medium);
        assert_eq!(
            assessment.primary_concerns,
            vec!["AQI unhealthy for sensitive groups (120)".to_string()]
        );
    }

    #[rstest]
    #[case(0, 0.0)]
    #[case(50, 20.0)]
    #[case(75, 35.0)]
    #[case(100, 50.0)]
    #[case(130, 68.0)]
    #[case(150, 80.0)]
    #[case(200, 100.0)]
    #[case(400, 100.0)]
    fn test_air_quality_sub_score(#[case] aqi: u32, #[case] expected: f64) {
        let (score, _) = score_air_quality(aqi);
        assert!((score - expected).abs() < 1e-9, "aqi {aqi} scored {score}");
    }

    #[rstest]
    #[case(10.0, 70.0, Some("Very cold (10°F)"))]
    #[case(25.0, 50.0, Some("Freezing (25°F)"))]
    #[case(105.0, 90.0, Some("Extreme heat (105°F)"))]
    #[case(95.0, 60.0, Some("Hot weather (95°F)"))]
    #[case(85.0, 30.0, None)]
    #[case(70.0, 0.0, None)]
    #[case(50.0, 40.0, None)]
    fn test_temperature_sub_score(
        #[case] feels_like: f64,
        #[case] expected: f64,
        #[case] concern: Option<&str>,
    ) {
        let (score, actual_concern) = score_temperature(feels_like);
        assert!((score - expected).abs() < 1e-9);
        assert_eq!(actual_concern.as_deref(), concern);
    }

    #[test]
    fn test_wind_and_visibility_sub_scores() {
        assert_eq!(score_wind(35.0), (60.0, Some("High winds (35 mph)".to_string())));
        assert_eq!(score_wind(25.0), (30.0, None));
        assert_eq!(score_wind(12.5), (12.5, None));

        assert_eq!(
            score_visibility(0.5),
            (70.0, Some("Low visibility (0.5 mi)".to_string()))
        );
        assert_eq!(score_visibility(2.0), (40.0, None));
        assert_eq!(score_visibility(10.0), (0.0, None));
    }

    #[test]
    fn test_all_sources_weighted_average() {
        let w = weather(95.0, 10.0, 10.0);
        let aq = air_quality(130);
        let assessment = RiskCalculator::new().calculate(Some(&w), Some(&aq));

        let expected = (68.0 * 0.35 + 60.0 * 0.25 + 10.0 * 0.10 + 0.0 * 0.15) / 0.85;
        assert!((assessment.overall_score - expected).abs() < 1e-9);
        assert_eq!(assessment.confidence, Confidence::High);
        assert_eq!(assessment.factors.len(), 4);
        assert_eq!(
            assessment.primary_concerns,
            vec![
                "AQI unhealthy for sensitive groups (130)".to_string(),
                "Hot weather (95°F)".to_string(),
            ]
        );
    }

    #[test]
    fn test_concern_order_air_quality_first() {
        let w = weather(10.0, 40.0, 0.2);
        let aq = air_quality(180);
        let assessment = RiskCalculator::new().calculate(Some(&w), Some(&aq));
        assert_eq!(
            assessment.primary_concerns,
            vec![
                "AQI unhealthy (180)".to_string(),
                "Very cold (10°F)".to_string(),
                "High winds (40 mph)".to_string(),
                "Low visibility (0.2 mi)".to_string(),
            ]
        );
    }

    #[test]
    fn test_weather_only_confidence_high() {
        let w = weather(70.0, 5.0, 10.0);
        let assessment = RiskCalculator::new().calculate(Some(&w), None);
        assert_eq!(assessment.confidence, Confidence::High);
        // (0*0.25 + 5*0.10 + 0*0.15) / 0.5
        assert!((assessment.overall_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let w = weather(88.0, 22.0, 2.5);
        let aq = air_quality(77);
        let calculator = RiskCalculator::new();
        let first = calculator.calculate(Some(&w), Some(&aq));
        let second = calculator.calculate(Some(&w), Some(&aq));
        assert_eq!(first, second);
        assert_eq!(first.overall_score.to_bits(), second.overall_score.to_bits());
    }
}
