//! Briefing workflow
//!
//! A run moves through a fixed phase graph ([`Phase`]) while a single
//! [`RunState`] accumulates observations, the risk assessment, the action
//! plan and the briefing text. [`HealthGuardian`] owns the collaborators and
//! drives the graph.

pub mod guardian;
pub mod phase;
pub mod state;

pub use guardian::HealthGuardian;
pub use phase::Phase;
pub use state::{
    ActionsPatch, AnalysisPatch, BriefingPatch, CollectionPatch, RunState, StepPatch, TrendPatch,
};
