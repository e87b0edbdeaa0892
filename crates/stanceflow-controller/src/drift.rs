//! Drift magnitude and per-turn delta scaling.
//!
//! Magnitude is structural: it counts which fields a delta sets, not how far
//! the numbers move. Setting `risk` from 50 to 51 costs the same as 50 to 100.

use stanceflow_core::StanceDelta;
use tracing::debug;

pub const FRAME_WEIGHT: f64 = 15.0;
pub const SELF_MODEL_WEIGHT: f64 = 15.0;
pub const OBJECTIVE_WEIGHT: f64 = 10.0;
pub const VALUE_WEIGHT: f64 = 5.0;
pub const SENTIENCE_LEVEL_WEIGHT: f64 = 5.0;

/// Below this scale factor the frame and self-model changes are dropped.
pub const TRUNCATION_SCALE: f64 = 0.5;

/// Drift cost of a proposed delta. Lists (metaphors, constraints,
/// sentience lists) are free.
pub fn calculate_drift_magnitude(delta: &StanceDelta) -> f64 {
    let mut magnitude = 0.0;
    if delta.frame.is_some() {
        magnitude += FRAME_WEIGHT;
    }
    if delta.self_model.is_some() {
        magnitude += SELF_MODEL_WEIGHT;
    }
    if delta.objective.is_some() {
        magnitude += OBJECTIVE_WEIGHT;
    }
    if let Some(values) = &delta.values {
        magnitude += VALUE_WEIGHT * values.defined_count() as f64;
    }
    if let Some(sentience) = &delta.sentience {
        magnitude += SENTIENCE_LEVEL_WEIGHT * sentience.defined_level_count() as f64;
    }
    magnitude
}

/// Outcome of fitting a delta into the per-turn cap.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledDelta {
    pub delta: StanceDelta,
    /// `max_per_turn / magnitude` when over the cap, else 1.0.
    pub scale_factor: f64,
    /// Whether frame/self-model were dropped.
    pub truncated: bool,
}

/// Fit a delta into `max_per_turn`.
///
/// This is coarse truncation, not proportional scaling: if the scale
/// factor falls below 0.5 the frame and self-model changes are removed and
/// everything else passes through untouched. Between 0.5 and 1.0 the delta
/// is returned as-is even though it is nominally over the cap.
pub fn scale_delta(delta: &StanceDelta, magnitude: f64, max_per_turn: f64) -> ScaledDelta {
    if magnitude <= max_per_turn || magnitude <= 0.0 {
        return ScaledDelta {
            delta: delta.clone(),
            scale_factor: 1.0,
            truncated: false,
        };
    }

    let scale_factor = max_per_turn / magnitude;
    if scale_factor < TRUNCATION_SCALE {
        debug!(
            magnitude,
            max_per_turn, scale_factor, "Delta over per-turn cap, dropping frame/selfModel"
        );
        let mut truncated = delta.clone();
        truncated.frame = None;
        truncated.self_model = None;
        ScaledDelta {
            delta: truncated,
            scale_factor,
            truncated: true,
        }
    } else {
        ScaledDelta {
            delta: delta.clone(),
            scale_factor,
            truncated: false,
        }
    }
}
