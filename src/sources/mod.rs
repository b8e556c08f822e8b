//! External data sources
//!
//! Each reader normalizes a provider-specific payload into one of the typed
//! observation records. Readers report "no data" as `Ok(None)` and only use
//! `Err` for failures; the workflow turns both into error-list entries.

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use thiserror::Error;

use crate::models::{AirQualityObservation, Location, WeatherObservation};

pub mod airnow;
pub mod openweather;

pub use airnow::AirNowClient;
pub use openweather::OpenWeatherClient;

/// Failure while reading from an external source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("missing API key for {0}")]
    MissingCredential(&'static str),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("unexpected payload: {0}")]
    Parse(String),

    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Reads current weather for a location
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn get_current_weather(
        &self,
        location: &Location,
    ) -> Result<Option<WeatherObservation>, SourceError>;
}

/// Reads the current primary air-quality index for a location
#[async_trait]
pub trait AirQualitySource: Send + Sync {
    async fn get_current_aqi(
        &self,
        location: &Location,
    ) -> Result<Option<AirQualityObservation>, SourceError>;
}

/// HTTP client with a request timeout and transient-failure retries
pub(crate) fn build_http_client(
    timeout: Duration,
    max_retries: u32,
) -> Result<ClientWithMiddleware, SourceError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("HealthGuard/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SourceError::Transport(format!("failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Sends a GET and returns the body of a successful response
pub(crate) async fn get_text(
    client: &ClientWithMiddleware,
    provider: &'static str,
    url: reqwest::Url,
) -> Result<String, SourceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            provider,
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| SourceError::Transport(e.to_string()))
}
