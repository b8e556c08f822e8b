use serde::{Deserialize, Serialize};
use std::fmt;

use super::state::RunState;

/// Workflow phases. The graph has one entry, one terminal phase and no cycles:
///
/// ```text
/// collecting_data -> analyzing_risk -> checking_trends | skipping_trends
///                 -> generating_actions -> drafting_briefing -> complete
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    CollectingData,
    AnalyzingRisk,
    CheckingTrends,
    SkippingTrends,
    GeneratingActions,
    DraftingBriefing,
    Complete,
}

impl Phase {
    /// Phase that follows `self` given the state after `self` ran.
    /// The only branch is on `trend_check_needed`.
    #[must_use]
    pub fn next(self, state: &RunState) -> Option<Phase> {
        match self {
            Phase::CollectingData => Some(Phase::AnalyzingRisk),
            Phase::AnalyzingRisk if state.trend_check_needed => Some(Phase::CheckingTrends),
            Phase::AnalyzingRisk => Some(Phase::SkippingTrends),
            Phase::CheckingTrends | Phase::SkippingTrends => Some(Phase::GeneratingActions),
            Phase::GeneratingActions => Some(Phase::DraftingBriefing),
            Phase::DraftingBriefing => Some(Phase::Complete),
            Phase::Complete => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::CollectingData => "collecting_data",
            Phase::AnalyzingRisk => "analyzing_risk",
            Phase::CheckingTrends => "checking_trends",
            Phase::SkippingTrends => "skipping_trends",
            Phase::GeneratingActions => "generating_actions",
            Phase::DraftingBriefing => "drafting_briefing",
            Phase::Complete => "complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(trend_check_needed: bool) -> Vec<Phase> {
        let mut state = RunState::new();
        state.trend_check_needed = trend_check_needed;
        let mut path = vec![Phase::CollectingData];
        let mut phase = Phase::CollectingData;
        while let Some(next) = phase.next(&state) {
            path.push(next);
            phase = next;
        }
        path
    }

    #[test]
    fn test_path_with_trend_check() {
        assert_eq!(
            walk(true),
            vec![
                Phase::CollectingData,
                Phase::AnalyzingRisk,
                Phase::CheckingTrends,
                Phase::GeneratingActions,
                Phase::DraftingBriefing,
                Phase::Complete,
            ]
        );
    }

    #[test]
    fn test_path_skipping_trend_check() {
        let path = walk(false);
        assert!(path.contains(&Phase::SkippingTrends));
        assert!(!path.contains(&Phase::CheckingTrends));
        assert_eq!(path.last(), Some(&Phase::Complete));
    }

    #[test]
    fn test_complete_is_terminal() {
        assert_eq!(Phase::Complete.next(&RunState::new()), None);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::SkippingTrends.to_string(), "skipping_trends");
        assert_eq!(
            serde_json::to_string(&Phase::DraftingBriefing).unwrap(),
            "\"drafting_briefing\""
        );
    }
}
