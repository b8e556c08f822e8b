//! Scoring module
//!
//! - Risk calculation: weighted composite score over the available observations
//! - Action planning: prioritized recommendations derived from an assessment

pub mod action_planner;
pub mod risk_calculator;

pub use action_planner::{ActionPlan, ActionPlanner, PlannedAction, Priority};
pub use risk_calculator::{
    Confidence, Factor, FactorScore, RiskAssessment, RiskCalculator, RiskLevel,
};
