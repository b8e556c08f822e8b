//! Run state threaded through the workflow
//!
//! Every phase returns a patch that is merged with [`RunState::apply`]. The
//! fields each patch writes are disjoint, except `errors`, which is
//! append-only:
//!
//! | Patch | Writes |
//! |---|---|
//! | [`CollectionPatch`] | `weather`, `air_quality`, `completeness`, `errors` |
//! | [`AnalysisPatch`] | `risk_score`, `risk_level`, `confidence`, `primary_concerns`, `risk_factors`, `trend_check_needed` |
//! | [`TrendPatch`] | `trend_alert` |
//! | [`ActionsPatch`] | `action_plan`, `briefing_type` |
//! | [`BriefingPatch`] | `briefing_text`, `errors` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phase::Phase;
use crate::models::{AirQualityObservation, WeatherObservation};
use crate::narrative::{BriefingContext, BriefingType};
use crate::scoring::{ActionPlan, Confidence, FactorScore, RiskAssessment, RiskLevel};

const UNKNOWN: &str = "unknown";
const NOT_AVAILABLE: &str = "N/A";

/// Mutable aggregate for a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,

    pub weather: Option<WeatherObservation>,
    pub air_quality: Option<AirQualityObservation>,
    /// Fraction of the two sources that returned data
    pub completeness: f64,

    pub risk_score: f64,
    /// `None` until the risk has been analyzed
    pub risk_level: Option<RiskLevel>,
    pub confidence: Option<Confidence>,
    pub primary_concerns: Vec<String>,
    pub risk_factors: Vec<FactorScore>,

    pub trend_check_needed: bool,
    pub trend_alert: bool,

    pub action_plan: Option<ActionPlan>,
    pub briefing_type: BriefingType,
    pub briefing_text: String,

    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPatch {
    pub weather: Option<WeatherObservation>,
    pub air_quality: Option<AirQualityObservation>,
    pub completeness: f64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPatch {
    pub assessment: RiskAssessment,
    pub trend_check_needed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPatch {
    pub trend_alert: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionsPatch {
    pub action_plan: ActionPlan,
    pub briefing_type: BriefingType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BriefingPatch {
    pub briefing_text: String,
    pub errors: Vec<String>,
}

/// Output of one workflow phase
#[derive(Debug, Clone, PartialEq)]
pub enum StepPatch {
    Collected(CollectionPatch),
    Analyzed(AnalysisPatch),
    Trends(TrendPatch),
    Actions(ActionsPatch),
    Briefing(BriefingPatch),
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    /// Fresh state with an 8-character run id
    #[must_use]
    pub fn new() -> Self {
        let mut run_id = Uuid::new_v4().simple().to_string();
        run_id.truncate(8);
        Self {
            run_id,
            timestamp: Utc::now(),
            phase: Phase::CollectingData,
            weather: None,
            air_quality: None,
            completeness: 0.0,
            risk_score: 0.0,
            risk_level: None,
            confidence: None,
            primary_concerns: Vec::new(),
            risk_factors: Vec::new(),
            trend_check_needed: false,
            trend_alert: false,
            action_plan: None,
            briefing_type: BriefingType::Short,
            briefing_text: String::new(),
            errors: Vec::new(),
        }
    }

    /// Merge a phase's output into the state
    pub fn apply(&mut self, patch: StepPatch) {
        match patch {
            StepPatch::Collected(patch) => {
                self.weather = patch.weather;
                self.air_quality = patch.air_quality;
                self.completeness = patch.completeness;
                self.errors.extend(patch.errors);
            }
            StepPatch::Analyzed(patch) => {
                let assessment = patch.assessment;
                self.risk_score = assessment.overall_score;
                self.risk_level = Some(assessment.risk_level);
                self.confidence = Some(assessment.confidence);
                self.primary_concerns = assessment.primary_concerns;
                self.risk_factors = assessment.factors;
                self.trend_check_needed = patch.trend_check_needed;
            }
            StepPatch::Trends(patch) => {
                self.trend_alert = patch.trend_alert;
            }
            StepPatch::Actions(patch) => {
                self.action_plan = Some(patch.action_plan);
                self.briefing_type = patch.briefing_type;
            }
            StepPatch::Briefing(patch) => {
                self.briefing_text = patch.briefing_text;
                self.errors.extend(patch.errors);
            }
        }
    }

    #[must_use]
    pub fn risk_level_label(&self) -> &'static str {
        self.risk_level.map_or(UNKNOWN, RiskLevel::as_str)
    }

    #[must_use]
    pub fn confidence_label(&self) -> &'static str {
        self.confidence.map_or(UNKNOWN, Confidence::as_str)
    }

    /// Assessment rebuilt from the stored score, level and confidence.
    /// Concerns and factor scores are not carried over.
    #[must_use]
    pub fn assessment_view(&self) -> RiskAssessment {
        RiskAssessment {
            overall_score: self.risk_score,
            risk_level: self
                .risk_level
                .unwrap_or_else(|| RiskLevel::from_score(self.risk_score)),
            confidence: self.confidence.unwrap_or(Confidence::Low),
            primary_concerns: Vec::new(),
            factors: Vec::new(),
        }
    }

    /// Digest handed to the narrative drafter
    #[must_use]
    pub fn briefing_context(&self, location: &str) -> BriefingContext {
        BriefingContext {
            location: location.to_string(),
            weather: self
                .weather
                .as_ref()
                .map_or_else(|| NOT_AVAILABLE.to_string(), WeatherObservation::summary),
            air_quality: self
                .air_quality
                .as_ref()
                .map_or_else(|| NOT_AVAILABLE.to_string(), AirQualityObservation::summary),
            risk_score: self.risk_score,
            risk_level: self.risk_level_label().to_string(),
            briefing_type: self.briefing_type,
            urgent: self.risk_score >= 70.0,
        }
    }
}
