//! Workflow orchestrator
//!
//! Drives a fresh [`RunState`] through the phase graph. Source failures are
//! recorded and never abort the run; a narrative failure does, unless the
//! template fallback is enabled.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::phase::Phase;
use super::state::{
    ActionsPatch, AnalysisPatch, BriefingPatch, CollectionPatch, RunState, StepPatch, TrendPatch,
};
use crate::config::HealthGuardConfig;
use crate::models::Location;
use crate::narrative::{
    BriefingType, NarrativeDrafter, OpenAiDrafter, RetryingDrafter, TemplateDrafter,
};
use crate::retry::Backoff;
use crate::scoring::{ActionPlanner, RiskCalculator};
use crate::sources::{AirNowClient, AirQualitySource, OpenWeatherClient, SourceError, WeatherSource};
use crate::Result;

const TREND_CHECK_THRESHOLD: f64 = 50.0;
const TREND_ALERT_THRESHOLD: f64 = 70.0;
const SOURCE_COUNT: f64 = 2.0;

/// Stateless between runs; share it freely behind an `Arc`
pub struct HealthGuardian {
    location: Location,
    weather_source: Arc<dyn WeatherSource>,
    air_quality_source: Arc<dyn AirQualitySource>,
    drafter: Arc<dyn NarrativeDrafter>,
    calculator: RiskCalculator,
    planner: ActionPlanner,
    source_timeout: Duration,
    template_fallback: bool,
}

impl HealthGuardian {
    pub fn new(
        location: Location,
        weather_source: Arc<dyn WeatherSource>,
        air_quality_source: Arc<dyn AirQualitySource>,
        drafter: Arc<dyn NarrativeDrafter>,
    ) -> Self {
        Self {
            location,
            weather_source,
            air_quality_source,
            drafter,
            calculator: RiskCalculator::new(),
            planner: ActionPlanner::new(),
            source_timeout: Duration::from_secs(10),
            template_fallback: false,
        }
    }

    /// Build the production pipeline: OpenWeatherMap, AirNow and an
    /// OpenAI-compatible drafter
    pub fn from_config(config: &HealthGuardConfig) -> Result<Self> {
        let weather = OpenWeatherClient::new(&config.sources)?;
        let air_quality = AirNowClient::new(&config.sources)?;

        let openai = OpenAiDrafter::new(&config.narrative)?;
        let drafter: Arc<dyn NarrativeDrafter> = if config.narrative.max_retries > 0 {
            Arc::new(RetryingDrafter::new(
                openai,
                Backoff::new(config.narrative.max_retries, Duration::from_secs(1)),
            ))
        } else {
            Arc::new(openai)
        };

        Ok(Self::new(
            config.location.to_location(),
            Arc::new(weather),
            Arc::new(air_quality),
            drafter,
        )
        .with_source_timeout(Duration::from_secs(config.sources.timeout_seconds))
        .with_template_fallback(config.narrative.fallback_to_template))
    }

    #[must_use]
    pub fn with_source_timeout(mut self, source_timeout: Duration) -> Self {
        self.source_timeout = source_timeout;
        self
    }

    #[must_use]
    pub fn with_template_fallback(mut self, enabled: bool) -> Self {
        self.template_fallback = enabled;
        self
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Execute one complete run
    pub async fn run(&self) -> Result<RunState> {
        self.run_with_state(RunState::new()).await
    }

    #[instrument(name = "briefing_run", skip(self, state), fields(run_id = %state.run_id))]
    async fn run_with_state(&self, mut state: RunState) -> Result<RunState> {
        info!("Running health briefing for {}", self.location);

        let mut phase = Phase::CollectingData;
        loop {
            state.phase = phase;
            if phase == Phase::Complete {
                break;
            }
            let patch = self.execute(phase, &state).await?;
            state.apply(patch);
            match phase.next(&state) {
                Some(next) => phase = next,
                None => break,
            }
        }

        info!(
            "Briefing complete: score {:.1} ({}), {} error(s)",
            state.risk_score,
            state.risk_level_label(),
            state.errors.len()
        );
        Ok(state)
    }

    async fn execute(&self, phase: Phase, state: &RunState) -> Result<StepPatch> {
        debug!("Entering phase {}", phase);
        let patch = match phase {
            Phase::CollectingData => StepPatch::Collected(self.collect_data().await),
            Phase::AnalyzingRisk => StepPatch::Analyzed(self.analyze_risk(state)),
            Phase::CheckingTrends => StepPatch::Trends(check_trends(state)),
            Phase::SkippingTrends => StepPatch::Trends(skip_trends()),
            Phase::GeneratingActions => StepPatch::Actions(self.generate_actions(state)),
            Phase::DraftingBriefing => StepPatch::Briefing(self.draft_briefing(state).await?),
            // the run loop stops before executing the terminal phase
            Phase::Complete => unreachable!("complete phase is never executed"),
        };
        Ok(patch)
    }

    async fn collect_data(&self) -> CollectionPatch {
        info!("Collecting data");
        let limit = self.source_timeout;

        let (weather, air_quality) = tokio::join!(
            timeout(limit, self.weather_source.get_current_weather(&self.location)),
            timeout(limit, self.air_quality_source.get_current_aqi(&self.location)),
        );

        let mut errors = Vec::new();
        let weather = settle("Weather", weather, limit, &mut errors);
        let air_quality = settle("AQI", air_quality, limit, &mut errors);

        let available = u8::from(weather.is_some()) + u8::from(air_quality.is_some());
        CollectionPatch {
            weather,
            air_quality,
            completeness: f64::from(available) / SOURCE_COUNT,
            errors,
        }
    }

    fn analyze_risk(&self, state: &RunState) -> AnalysisPatch {
        info!("Analyzing risk");
        let assessment = self
            .calculator
            .calculate(state.weather.as_ref(), state.air_quality.as_ref());
        let trend_check_needed = assessment.overall_score >= TREND_CHECK_THRESHOLD;
        debug!(
            "Risk score {:.1} from {} factor(s)",
            assessment.overall_score,
            assessment.factors.len()
        );
        AnalysisPatch {
            assessment,
            trend_check_needed,
        }
    }

    fn generate_actions(&self, state: &RunState) -> ActionsPatch {
        info!("Generating actions");
        let action_plan = self.planner.generate(&state.assessment_view());
        ActionsPatch {
            action_plan,
            briefing_type: BriefingType::from_score(state.risk_score),
        }
    }

    async fn draft_briefing(&self, state: &RunState) -> Result<BriefingPatch> {
        info!("Drafting briefing");
        let context = state.briefing_context(&self.location.name);

        match self.drafter.draft(&context).await {
            Ok(briefing_text) => Ok(BriefingPatch {
                briefing_text,
                errors: Vec::new(),
            }),
            Err(err) if self.template_fallback => {
                warn!("Narrative drafting failed, using template: {}", err);
                Ok(BriefingPatch {
                    briefing_text: TemplateDrafter::new().render(&context),
                    errors: vec![format!("Narrative error: {err} (template fallback used)")],
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Placeholder for anomaly detection: alert when the risk is very high
fn check_trends(state: &RunState) -> TrendPatch {
    info!("Checking trends");
    TrendPatch {
        trend_alert: state.risk_score >= TREND_ALERT_THRESHOLD,
    }
}

fn skip_trends() -> TrendPatch {
    info!("Skipping trend check");
    TrendPatch { trend_alert: false }
}

/// Turn a bounded source read into an observation, recording any failure
fn settle<T>(
    label: &str,
    outcome: std::result::Result<
        std::result::Result<Option<T>, SourceError>,
        tokio::time::error::Elapsed,
    >,
    limit: Duration,
    errors: &mut Vec<String>,
) -> Option<T> {
    let failure = match outcome {
        Ok(Ok(Some(observation))) => return Some(observation),
        Ok(Ok(None)) => "no data returned".to_string(),
        Ok(Err(err)) => err.to_string(),
        Err(_) => SourceError::Timeout(limit.as_secs()).to_string(),
    };
    warn!("{} source unavailable: {}", label, failure);
    errors.push(format!("{label} error: {failure}"));
    None
}
