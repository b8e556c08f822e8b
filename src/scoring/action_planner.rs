//! Action plan generation from a risk assessment

use serde::{Deserialize, Serialize};
use std::fmt;

use super::risk_calculator::RiskAssessment;

const AIR_QUALITY_MARKER: &str = "AQI";
const HEAT_MARKER: &str = "heat";

const STAY_INDOORS: &str = "Stay indoors if possible!";
const LIMIT_EXPOSURE: &str = "Limit outdoor exposure.";
const WEAR_MASK: &str = "Wear N95 mask outdoors.";
const STAY_HYDRATED: &str = "Stay hydrated";

/// Urgency of a recommended action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub priority: Priority,
    pub action: String,
}

impl PlannedAction {
    fn new(priority: Priority, action: &str) -> Self {
        Self {
            priority,
            action: action.to_string(),
        }
    }
}

/// Recommendations for the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    /// Severity tag plus rounded score, e.g. `🟡 Risk: 47/100`
    pub summary: String,
    /// In the order the rules produced them
    pub actions: Vec<PlannedAction>,
    pub outdoor_exercise_safe: bool,
    pub mask_recommended: bool,
}

/// Stateless rule-based planner
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionPlanner;

impl ActionPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn generate(&self, assessment: &RiskAssessment) -> ActionPlan {
        let score = assessment.overall_score;
        let mut actions = Vec::new();
        let mut outdoor_exercise_safe = true;
        let mut mask_recommended = false;

        if score >= 70.0 {
            actions.push(PlannedAction::new(Priority::Critical, STAY_INDOORS));
            outdoor_exercise_safe = false;
        } else if score >= 50.0 {
            actions.push(PlannedAction::new(Priority::High, LIMIT_EXPOSURE));
        }

        if assessment
            .primary_concerns
            .iter()
            .any(|concern| concern.contains(AIR_QUALITY_MARKER))
        {
            mask_recommended = true;
            actions.push(PlannedAction::new(Priority::High, WEAR_MASK));
        }

        // One hydration action per heat concern; unlike the mask it is not deduplicated
        for _ in assessment
            .primary_concerns
            .iter()
            .filter(|concern| concern.to_lowercase().contains(HEAT_MARKER))
        {
            actions.push(PlannedAction::new(Priority::Medium, STAY_HYDRATED));
        }

        ActionPlan {
            summary: summary_line(score),
            actions,
            outdoor_exercise_safe,
            mask_recommended,
        }
    }
}

fn summary_line(score: f64) -> String {
    let tag = if score >= 70.0 {
        "🔴"
    } else if score >= 40.0 {
        "🟡"
    } else {
        "🟢"
    };
    format!("{tag} Risk: {score:.0}/100")
}
