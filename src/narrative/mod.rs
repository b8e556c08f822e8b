//! Narrative drafting
//!
//! Turns the structured result of a run into a short natural-language
//! briefing. The drafter is an external collaborator behind
//! [`NarrativeDrafter`]; the workflow only hands it a [`BriefingContext`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::retry::{Backoff, with_backoff_when};

pub mod openai;
pub mod template;

pub use openai::OpenAiDrafter;
pub use template::TemplateDrafter;

/// Narrative drafting errors
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("missing API key for the narrative service")]
    MissingCredential,
    #[error("http error: {0}")]
    Http(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl NarrativeError {
    /// A missing key fails the same way on every attempt
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, NarrativeError::MissingCredential)
    }
}

/// Coarse bucket used to tune narrative tone and length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BriefingType {
    #[default]
    Short,
    Moderate,
    HighRisk,
}

impl BriefingType {
    /// `high_risk` at 70 and above, `moderate` from 40, otherwise `short`
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            BriefingType::HighRisk
        } else if score >= 40.0 {
            BriefingType::Moderate
        } else {
            BriefingType::Short
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BriefingType::Short => "short",
            BriefingType::Moderate => "moderate",
            BriefingType::HighRisk => "high_risk",
        }
    }
}

impl fmt::Display for BriefingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact digest of a run handed to the drafter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BriefingContext {
    pub location: String,
    /// e.g. `78°F, clear sky`, or `N/A`
    pub weather: String,
    /// e.g. `AQI 112 (Unhealthy for Sensitive Groups)`, or `N/A`
    pub air_quality: String,
    pub risk_score: f64,
    pub risk_level: String,
    pub briefing_type: BriefingType,
    pub urgent: bool,
}

impl BriefingContext {
    /// User prompt for a chat-style language model
    #[must_use]
    pub fn to_prompt(&self) -> String {
        let tone = if self.urgent {
            "HIGH RISK: Be urgent."
        } else {
            "Keep it brief and friendly."
        };
        format!(
            "Generate a brief {} health briefing:\n\n\
             Weather: {}\n\
             Air Quality: {}\n\
             Risk Score: {:.0}/100 ({})\n\n\
             {}\n\
             Include 2-3 recommendations. Under 100 words.",
            self.location,
            self.weather,
            self.air_quality,
            self.risk_score,
            self.risk_level,
            tone
        )
    }
}

/// Produces briefing text from a digest
#[async_trait]
pub trait NarrativeDrafter: Send + Sync {
    async fn draft(&self, context: &BriefingContext) -> Result<String, NarrativeError>;
}

/// Retries the inner drafter with exponential backoff. Errors that cannot
/// succeed on a retry are returned immediately.
pub struct RetryingDrafter<D> {
    inner: D,
    backoff: Backoff,
}

impl<D: NarrativeDrafter> RetryingDrafter<D> {
    pub fn new(inner: D, backoff: Backoff) -> Self {
        Self { inner, backoff }
    }
}

#[async_trait]
impl<D: NarrativeDrafter> NarrativeDrafter for RetryingDrafter<D> {
    async fn draft(&self, context: &BriefingContext) -> Result<String, NarrativeError> {
        let inner = &self.inner;
        with_backoff_when(
            self.backoff,
            move || inner.draft(context),
            NarrativeError::is_retryable,
        )
        .await
    }
}
