//! Deterministic templated briefing, used when no language model is available

use async_trait::async_trait;

use super::{BriefingContext, BriefingType, NarrativeDrafter, NarrativeError};

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDrafter;

impl TemplateDrafter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn render(&self, context: &BriefingContext) -> String {
        let advice = match context.briefing_type {
            BriefingType::HighRisk => {
                "Conditions are hazardous today. Stay indoors where possible, \
                 keep any outdoor activity short and check on vulnerable neighbours."
            }
            BriefingType::Moderate => {
                "Sensitive groups should limit prolonged outdoor exertion \
                 and keep water at hand."
            }
            BriefingType::Short => "Conditions look fine for your usual outdoor plans.",
        };

        format!(
            "{} health briefing: risk {:.0}/100 ({}).\nWeather: {}. Air quality: {}.\n{}",
            context.location,
            context.risk_score,
            context.risk_level.replace('_', " "),
            context.weather,
            context.air_quality,
            advice
        )
    }
}

#[async_trait]
impl NarrativeDrafter for TemplateDrafter {
    async fn draft(&self, context: &BriefingContext) -> Result<String, NarrativeError> {
        Ok(self.render(context))
    }
}
