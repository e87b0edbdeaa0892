//! Closed-form decay curves and the fixed per-field curve table.

use serde::{Deserialize, Serialize};
use stanceflow_core::{clamp_score, SentienceLevel, Stance, ValueKey};
use std::f64::consts::{LN_2, PI};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayCurve {
    Exponential,
    Linear,
    Logarithmic,
    Plateau,
    Step,
    Oscillating,
}

impl DecayCurve {
    pub fn as_str(self) -> &'static str {
        match self {
            DecayCurve::Exponential => "exponential",
            DecayCurve::Linear => "linear",
            DecayCurve::Logarithmic => "logarithmic",
            DecayCurve::Plateau => "plateau",
            DecayCurve::Step => "step",
            DecayCurve::Oscillating => "oscillating",
        }
    }
}

/// Project `current` forward `hours_elapsed` hours toward `baseline`.
///
/// At zero elapsed time the input is returned unchanged. Results are
/// clamped to [0, 100]. A non-positive half-life collapses to baseline.
pub fn calculate_decayed_value(
    curve: DecayCurve,
    current: f64,
    baseline: f64,
    half_life_hours: f64,
    hours_elapsed: f64,
) -> f64 {
    if hours_elapsed <= 0.0 {
        return current;
    }
    if half_life_hours <= 0.0 {
        return clamp_score(baseline);
    }

    let above = current - baseline;
    let t = hours_elapsed;
    let lambda = LN_2 / half_life_hours;

    let value = match curve {
        DecayCurve::Exponential => baseline + above * (-lambda * t).exp(),
        DecayCurve::Linear => current - above * t / (2.0 * half_life_hours),
        DecayCurve::Logarithmic => baseline + above / (1.0 + (1.0 + t / half_life_hours).ln()),
        DecayCurve::Plateau => baseline + above * (1.0 - (t / (2.0 * half_life_hours)).tanh()),
        DecayCurve::Step => baseline + above * 0.5_f64.powf((t / half_life_hours).floor()),
        DecayCurve::Oscillating => {
            baseline
                + above * (-0.5 * lambda * t).exp() * (1.0 + 0.1 * (2.0 * PI * t / 24.0).cos())
        }
    };
    clamp_score(value)
}

/// A numeric stance field subject to decay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecayField {
    Value(ValueKey),
    Sentience(SentienceLevel),
}

impl DecayField {
    pub fn all() -> impl Iterator<Item = DecayField> {
        ValueKey::ALL
            .into_iter()
            .map(DecayField::Value)
            .chain(SentienceLevel::ALL.into_iter().map(DecayField::Sentience))
    }

    pub fn name(self) -> &'static str {
        match self {
            DecayField::Value(k) => k.as_str(),
            DecayField::Sentience(l) => l.as_str(),
        }
    }

    /// Curve is fixed by field, not configurable per instance.
    pub fn curve(self) -> DecayCurve {
        match self {
            DecayField::Value(_) => DecayCurve::Exponential,
            DecayField::Sentience(SentienceLevel::AwarenessLevel)
            | DecayField::Sentience(SentienceLevel::AutonomyLevel) => DecayCurve::Plateau,
            DecayField::Sentience(SentienceLevel::IdentityStrength) => DecayCurve::Logarithmic,
        }
    }

    /// Half-life in hours. Shorter means more volatile between sessions.
    pub fn half_life_hours(self) -> f64 {
        match self {
            DecayField::Value(ValueKey::Curiosity) => 168.0,
            DecayField::Value(ValueKey::Certainty) => 336.0,
            DecayField::Value(ValueKey::Risk) => 240.0,
            DecayField::Value(ValueKey::Novelty) => 120.0,
            DecayField::Value(ValueKey::Empathy) => 504.0,
            DecayField::Value(ValueKey::Provocation) => 96.0,
            DecayField::Value(ValueKey::Synthesis) => 336.0,
            DecayField::Sentience(SentienceLevel::AwarenessLevel) => 720.0,
            DecayField::Sentience(SentienceLevel::AutonomyLevel) => 720.0,
            DecayField::Sentience(SentienceLevel::IdentityStrength) => 1440.0,
        }
    }

    pub fn read(self, stance: &Stance) -> f64 {
        match self {
            DecayField::Value(k) => stance.values.get(k),
            DecayField::Sentience(l) => stance.sentience.level(l),
        }
    }

    pub fn write(self, stance: &mut Stance, value: f64) {
        match self {
            DecayField::Value(k) => stance.values.set(k, value),
            DecayField::Sentience(l) => stance.sentience.set_level(l, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CURVES: [DecayCurve; 6] = [
        DecayCurve::Exponential,
        DecayCurve::Linear,
        DecayCurve::Logarithmic,
        DecayCurve::Plateau,
        DecayCurve::Step,
        DecayCurve::Oscillating,
    ];

    #[test]
    fn zero_elapsed_is_identity_for_every_curve() {
        for curve in ALL_CURVES {
            assert_eq!(calculate_decayed_value(curve, 73.3, 50.0, 120.0, 0.0), 73.3);
        }
    }

    #[test]
    fn exponential_halves_distance_at_half_life() {
        let v = calculate_decayed_value(DecayCurve::Exponential, 90.0, 50.0, 100.0, 100.0);
        assert!((v - 70.0).abs() < 1e-9);
    }

    #[test]
    fn step_holds_until_half_life() {
        let v = calculate_decayed_value(DecayCurve::Step, 90.0, 50.0, 100.0, 99.0);
        assert_eq!(v, 90.0);
        let v = calculate_decayed_value(DecayCurve::Step, 90.0, 50.0, 100.0, 200.0);
        assert_eq!(v, 60.0);
    }

    #[test]
    fn linear_crosses_baseline_at_twice_half_life() {
        let v = calculate_decayed_value(DecayCurve::Linear, 90.0, 50.0, 100.0, 200.0);
        assert!((v - 50.0).abs() < 1e-9);
    }

    #[test]
    fn field_table_matches_curve_assignment() {
        assert_eq!(DecayField::Value(ValueKey::Novelty).half_life_hours(), 120.0);
        assert_eq!(DecayField::Value(ValueKey::Empathy).half_life_hours(), 504.0);
        assert_eq!(
            DecayField::Sentience(SentienceLevel::IdentityStrength).curve(),
            DecayCurve::Logarithmic
        );
        assert_eq!(
            DecayField::Sentience(SentienceLevel::AwarenessLevel).curve(),
            DecayCurve::Plateau
        );
        assert_eq!(DecayField::all().count(), 10);
    }
}
