//! stanceflow decay - time-based projection of stance fields toward baseline

pub mod curve;
pub mod engine;
pub mod tracker;

pub use curve::{calculate_decayed_value, DecayCurve, DecayField};
pub use engine::{
    hours_between, DecayConfig, DecayEngine, DecayPrediction, DecayRecommendation, DecayReport,
    RecommendedAction, RiskLevel,
};
pub use tracker::ActivityTracker;
