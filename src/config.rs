//! Configuration management for the `HealthGuard` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::HealthGuardError;
use crate::models::Location;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure for the `HealthGuard` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthGuardConfig {
    /// City the briefing is produced for
    pub location: LocationConfig,
    /// Weather and air quality source settings
    pub sources: SourcesConfig,
    /// Narrative drafting settings
    pub narrative: NarrativeConfig,
    /// Briefing history settings
    pub history: HistoryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Dashboard server settings
    pub server: ServerConfig,
}

/// Briefing location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// External data source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// OpenWeatherMap API key
    pub openweather_api_key: Option<String>,
    /// Base URL for the OpenWeatherMap data API
    pub openweather_base_url: String,
    /// AirNow API key
    pub airnow_api_key: Option<String>,
    /// Base URL for the AirNow API
    pub airnow_base_url: String,
    /// Search radius for AirNow reporting areas
    pub airnow_distance_miles: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
}

/// Narrative drafting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// OpenAI (or compatible) API key
    pub api_key: Option<String>,
    /// Chat completions endpoint
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Retries with exponential backoff; 0 disables retrying
    pub max_retries: u32,
    /// Substitute a templated briefing when drafting fails
    pub fallback_to_template: bool,
}

/// Briefing history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory holding one JSON file per briefing
    pub directory: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

/// Dashboard server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

// Default value functions
fn default_history_directory() -> String {
    "outputs/briefings".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            name: "Boston, MA".to_string(),
            latitude: 42.3601,
            longitude: -71.0589,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            openweather_base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            airnow_api_key: None,
            airnow_base_url: "https://www.airnowapi.org/aq".to_string(),
            airnow_distance_miles: 25,
            timeout_seconds: 10,
            max_retries: 2,
        }
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            timeout_seconds: 30,
            max_retries: 0,
            fallback_to_template: false,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            directory: default_history_directory(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl LocationConfig {
    #[must_use]
    pub fn to_location(&self) -> Location {
        Location::new(self.latitude, self.longitude, self.name.clone())
    }
}

impl HealthGuardConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. HEALTHGUARD_SOURCES__TIMEOUT_SECONDS=5
        builder = builder.add_source(
            Environment::with_prefix("HEALTHGUARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: HealthGuardConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_credential_env(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("healthguard").join("config.toml"))
    }

    /// Fill unset API keys from the providers' conventional variables
    /// (`OPENWEATHER_API_KEY`, `AIRNOW_API_KEY`, `OPENAI_API_KEY`)
    pub fn apply_credential_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fill = |slot: &mut Option<String>, name: &str| {
            if slot.as_deref().is_none_or(str::is_empty) {
                if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                    *slot = Some(value);
                }
            }
        };
        fill(&mut self.sources.openweather_api_key, "OPENWEATHER_API_KEY");
        fill(&mut self.sources.airnow_api_key, "AIRNOW_API_KEY");
        fill(&mut self.narrative.api_key, "OPENAI_API_KEY");
    }

    /// Which provider keys are configured
    #[must_use]
    pub fn validate_keys(&self) -> BTreeMap<&'static str, bool> {
        let present = |key: &Option<String>| key.as_deref().is_some_and(|k| !k.is_empty());
        BTreeMap::from([
            ("openai", present(&self.narrative.api_key)),
            ("openweather", present(&self.sources.openweather_api_key)),
            ("airnow", present(&self.sources.airnow_api_key)),
        ])
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_location()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_location(&self) -> Result<()> {
        if !self.location.to_location().is_valid() {
            return Err(HealthGuardError::config(format!(
                "Location coordinates out of range: {}, {}",
                self.location.latitude, self.location.longitude
            ))
            .into());
        }
        if self.location.name.trim().is_empty() {
            return Err(HealthGuardError::config("Location name cannot be empty").into());
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.sources.timeout_seconds == 0 || self.sources.timeout_seconds > 300 {
            return Err(HealthGuardError::config(
                "Source timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if self.narrative.timeout_seconds == 0 || self.narrative.timeout_seconds > 300 {
            return Err(HealthGuardError::config(
                "Narrative timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if self.sources.max_retries > 10 || self.narrative.max_retries > 10 {
            return Err(HealthGuardError::config("Max retries cannot exceed 10").into());
        }

        if !(0.0..=2.0).contains(&self.narrative.temperature) {
            return Err(HealthGuardError::config(
                "Narrative temperature must be between 0.0 and 2.0",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(HealthGuardError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(HealthGuardError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("OpenWeatherMap", &self.sources.openweather_base_url),
            ("AirNow", &self.sources.airnow_base_url),
            ("Narrative", &self.narrative.endpoint),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(HealthGuardError::config(format!(
                    "{name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.history.directory.trim().is_empty() {
            return Err(HealthGuardError::config("History directory cannot be empty").into());
        }

        Ok(())
    }
}
