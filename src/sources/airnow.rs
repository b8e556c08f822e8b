//! AirNow current air-quality reader

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::{AirQualitySource, SourceError, build_http_client, get_text};
use crate::config::SourcesConfig;
use crate::models::{AirQualityObservation, Location};

const PROVIDER: &str = "AirNow";

pub struct AirNowClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    distance_miles: u32,
}

impl AirNowClient {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let client = build_http_client(
            Duration::from_secs(config.timeout_seconds),
            config.max_retries,
        )?;
        Ok(Self {
            client,
            base_url: config.airnow_base_url.trim_end_matches('/').to_string(),
            api_key: config.airnow_api_key.clone().filter(|k| !k.is_empty()),
            distance_miles: config.airnow_distance_miles,
        })
    }
}

#[async_trait]
impl AirQualitySource for AirNowClient {
    #[instrument(skip(self), fields(location = %location.name))]
    async fn get_current_aqi(
        &self,
        location: &Location,
    ) -> Result<Option<AirQualityObservation>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredential(PROVIDER))?;

        let url = reqwest::Url::parse_with_params(
            &format!("{}/observation/latLong/current/", self.base_url),
            &[
                ("format", "application/json".to_string()),
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("distance", self.distance_miles.to_string()),
                ("API_KEY", api_key.to_string()),
            ],
        )
        .map_err(|e| SourceError::Transport(format!("invalid air quality URL: {e}")))?;

        debug!("Requesting current AQI for {}", location.format_coordinates());
        let start_time = Instant::now();
        let body = get_text(&self.client, PROVIDER, url).await?;
        let observation = parse_observations(&body, Utc::now())?;

        match &observation {
            Some(aq) => info!(
                "Retrieved air quality in {:.3}s: {} from {}",
                start_time.elapsed().as_secs_f64(),
                aq.summary(),
                aq.reporting_area
            ),
            None => warn!("AirNow returned no observations near {}", location.name),
        }

        Ok(observation)
    }
}

#[derive(Debug, Deserialize)]
struct AirNowObservation {
    #[serde(rename = "ReportingArea")]
    reporting_area: String,
    #[serde(rename = "ParameterName")]
    parameter_name: String,
    #[serde(rename = "AQI")]
    aqi: i32,
    #[serde(rename = "Category")]
    category: AirNowCategory,
}

#[derive(Debug, Deserialize)]
struct AirNowCategory {
    #[serde(rename = "Name")]
    name: String,
}

/// Pick the worst pollutant from an AirNow observation list.
///
/// AirNow reports `-1` for pollutants it could not measure; those entries are
/// ignored. An empty (or all-missing) list yields `None`.
pub fn parse_observations(
    body: &str,
    observed_at: DateTime<Utc>,
) -> Result<Option<AirQualityObservation>, SourceError> {
    let observations: Vec<AirNowObservation> =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    let primary = observations
        .into_iter()
        .filter_map(|obs| u32::try_from(obs.aqi).ok().map(|aqi| (aqi, obs)))
        .max_by_key(|(aqi, _)| *aqi);

    Ok(primary.map(|(aqi, obs)| AirQualityObservation {
        timestamp: observed_at,
        aqi,
        pollutant: obs.parameter_name,
        category: obs.category.name,
        reporting_area: obs.reporting_area,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthGuardConfig;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"[
        {"DateObserved": "2024-07-01 ", "HourObserved": 8, "LocalTimeZone": "EST",
         "ReportingArea": "Boston", "StateCode": "MA", "Latitude": 42.351, "Longitude": -71.051,
         "ParameterName": "O3", "AQI": 61, "Category": {"Number": 2, "Name": "Moderate"}},
        {"DateObserved": "2024-07-01 ", "HourObserved": 8, "LocalTimeZone": "EST",
         "ReportingArea": "Boston", "StateCode": "MA", "Latitude": 42.351, "Longitude": -71.051,
         "ParameterName": "PM2.5", "AQI": 112,
         "Category": {"Number": 3, "Name": "Unhealthy for Sensitive Groups"}}
    ]"#;

    fn observed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_worst_pollutant_is_primary() {
        let observation = parse_observations(SAMPLE, observed_at()).unwrap().unwrap();
        assert_eq!(observation.aqi, 112);
        assert_eq!(observation.pollutant, "PM2.5");
        assert_eq!(observation.category, "Unhealthy for Sensitive Groups");
        assert_eq!(observation.reporting_area, "Boston");
        assert_eq!(observation.timestamp, observed_at());
    }

    #[test]
    fn test_empty_list_is_no_data() {
        assert_eq!(parse_observations("[]", observed_at()).unwrap(), None);
    }

    #[test]
    fn test_unmeasured_pollutants_are_ignored() {
        let body = r#"[{"ReportingArea": "Boston", "ParameterName": "PM10", "AQI": -1,
                        "Category": {"Number": 7, "Name": "Unavailable"}}]"#;
        assert_eq!(parse_observations(body, observed_at()).unwrap(), None);
    }

    #[test]
    fn test_error_object_is_parse_error() {
        let body = r#"{"WebServiceError": [{"Message": "Invalid API key"}]}"#;
        assert!(matches!(
            parse_observations(body, observed_at()),
            Err(SourceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_credential_error() {
        let mut config = HealthGuardConfig::default();
        config.sources.airnow_api_key = Some(String::new());
        let client = AirNowClient::new(&config.sources).unwrap();

        let result = client.get_current_aqi(&config.location.to_location()).await;
        assert!(matches!(result, Err(SourceError::MissingCredential(PROVIDER))));
    }
}
