//! Error types and handling for the `HealthGuard` application

use thiserror::Error;

use crate::narrative::NarrativeError;
use crate::sources::SourceError;

/// Main error type for the `HealthGuard` application
#[derive(Error, Debug)]
pub enum HealthGuardError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A data source could not be reached outside of a workflow run
    #[error("Source error: {source}")]
    Source {
        #[from]
        source: SourceError,
    },

    /// The briefing text could not be produced
    #[error("Narrative error: {source}")]
    Narrative {
        #[from]
        source: NarrativeError,
    },

    /// Briefing history errors
    #[error("History error: {message}")]
    History { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON encoding or decoding errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl HealthGuardError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new history error
    pub fn history<S: Into<String>>(message: S) -> Self {
        Self::History {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            HealthGuardError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and API keys.")
            }
            HealthGuardError::Source { .. } => {
                "Unable to reach the weather or air quality service. Please check your internet connection."
                    .to_string()
            }
            HealthGuardError::Narrative { .. } => {
                "The briefing text could not be generated. Please check your OpenAI API key or enable the template fallback."
                    .to_string()
            }
            HealthGuardError::History { message } => {
                format!("Briefing history unavailable: {message}")
            }
            HealthGuardError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            HealthGuardError::Serialization { .. } => {
                "A stored briefing could not be read or written.".to_string()
            }
        }
    }
}
