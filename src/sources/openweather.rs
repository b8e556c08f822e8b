//! OpenWeatherMap current-conditions reader

use async_trait::async_trait;
use chrono::DateTime;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::{SourceError, WeatherSource, build_http_client, get_text};
use crate::config::SourcesConfig;
use crate::models::{Location, WeatherObservation};

const PROVIDER: &str = "OpenWeatherMap";
const METERS_PER_MILE: f64 = 1609.34;
/// OpenWeatherMap omits visibility when it is at the 10 km cap
const DEFAULT_VISIBILITY_METERS: f64 = 10_000.0;

pub struct OpenWeatherClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let client = build_http_client(
            Duration::from_secs(config.timeout_seconds),
            config.max_retries,
        )?;
        Ok(Self {
            client,
            base_url: config.openweather_base_url.trim_end_matches('/').to_string(),
            api_key: config.openweather_api_key.clone().filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    #[instrument(skip(self), fields(location = %location.name))]
    async fn get_current_weather(
        &self,
        location: &Location,
    ) -> Result<Option<WeatherObservation>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredential(PROVIDER))?;

        let url = reqwest::Url::parse_with_params(
            &format!("{}/weather", self.base_url),
            &[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", api_key.to_string()),
                ("units", "imperial".to_string()),
            ],
        )
        .map_err(|e| SourceError::Transport(format!("invalid weather URL: {e}")))?;

        debug!("Requesting current weather for {}", location.format_coordinates());
        let start_time = Instant::now();
        let body = get_text(&self.client, PROVIDER, url).await?;
        let observation = parse_current_weather(&body)?;

        let elapsed = start_time.elapsed();
        info!(
            "Retrieved current weather in {:.3}s: {}",
            elapsed.as_secs_f64(),
            observation.summary()
        );
        if elapsed.as_secs() > 5 {
            warn!("Slow weather API response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(Some(observation))
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    dt: i64,
    main: MainBlock,
    wind: WindBlock,
    weather: Vec<ConditionBlock>,
    clouds: CloudsBlock,
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u16,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct CloudsBlock {
    all: u8,
}

/// Normalize an OpenWeatherMap `/weather` body (imperial units)
pub fn parse_current_weather(body: &str) -> Result<WeatherObservation, SourceError> {
    let response: CurrentWeatherResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    let condition = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::Parse("no weather conditions in response".to_string()))?;

    let timestamp = DateTime::from_timestamp(response.dt, 0)
        .ok_or_else(|| SourceError::Parse(format!("invalid timestamp {}", response.dt)))?;

    Ok(WeatherObservation {
        timestamp,
        temperature_f: response.main.temp,
        feels_like_f: response.main.feels_like,
        humidity: response.main.humidity,
        wind_speed_mph: response.wind.speed,
        condition: condition.main,
        description: condition.description,
        cloud_coverage: response.clouds.all,
        visibility_miles: response.visibility.unwrap_or(DEFAULT_VISIBILITY_METERS)
            / METERS_PER_MILE,
        pressure_hpa: response.main.pressure,
    })
}
