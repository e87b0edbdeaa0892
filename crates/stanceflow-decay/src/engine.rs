//! DecayEngine - projects unreinforced stance fields toward baseline and
//! flags the ones about to cross the alert threshold.
//!
//! Read/derive-only: nothing here mutates controller-owned state.

use crate::curve::{calculate_decayed_value, DecayCurve, DecayField};
use crate::tracker::ActivityTracker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stanceflow_core::Stance;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecayConfig {
    /// Value every field relaxes toward.
    pub baseline: f64,
    /// Projected values below this are at risk.
    pub alert_threshold: f64,
    /// How far ahead to search for a threshold crossing (hours).
    pub search_horizon_hours: u32,
    /// Idle time after which a re-engagement nudge is emitted (hours).
    pub inactivity_nudge_hours: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            baseline: 50.0,
            alert_threshold: 30.0,
            search_horizon_hours: 720,
            inactivity_nudge_hours: 72.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// critical < 24h, high < 72h, medium < 168h, low otherwise.
    pub fn from_hours(hours: f64) -> Self {
        if hours < 24.0 {
            RiskLevel::Critical
        } else if hours < 72.0 {
            RiskLevel::High
        } else if hours < 168.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayPrediction {
    pub field: DecayField,
    pub curve: DecayCurve,
    pub current_value: f64,
    pub half_life_hours: f64,
    pub projected_24h: f64,
    pub projected_7d: f64,
    /// Hours until the projection first drops below the threshold;
    /// infinite when no crossing occurs within the search horizon.
    pub time_to_threshold: f64,
    pub risk: RiskLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Reinforce,
    Monitor,
    Reengage,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayRecommendation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<DecayField>,
    pub priority: RiskLevel,
    pub action: RecommendedAction,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayReport {
    pub generated_at: DateTime<Utc>,
    pub hours_since_activity: f64,
    pub predictions: Vec<DecayPrediction>,
    pub recommendations: Vec<DecayRecommendation>,
}

impl DecayReport {
    pub fn at_risk(&self) -> impl Iterator<Item = &DecayPrediction> {
        self.predictions.iter().filter(|p| p.risk != RiskLevel::Low)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecayEngine {
    config: DecayConfig,
}

impl DecayEngine {
    pub fn new(config: DecayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    /// Decayed value of one field after `hours` without reinforcement.
    pub fn decayed_value(&self, field: DecayField, current: f64, hours: f64) -> f64 {
        calculate_decayed_value(
            field.curve(),
            current,
            self.config.baseline,
            field.half_life_hours(),
            hours,
        )
    }

    /// A copy of `stance` with every numeric field decayed by `hours`.
    /// Version and drift bookkeeping are untouched.
    pub fn project(&self, stance: &Stance, hours: f64) -> Stance {
        let mut out = stance.clone();
        for field in DecayField::all() {
            let v = self.decayed_value(field, field.read(stance), hours);
            field.write(&mut out, v);
        }
        out
    }

    /// Decay each field by the time since it was last reinforced.
    pub fn project_from_tracker(
        &self,
        stance: &Stance,
        tracker: &ActivityTracker,
        now: DateTime<Utc>,
    ) -> Stance {
        let mut out = stance.clone();
        for field in DecayField::all() {
            let hours = tracker.hours_since_reinforced(field, now);
            let v = self.decayed_value(field, field.read(stance), hours);
            field.write(&mut out, v);
        }
        out
    }

    /// First whole hour (1..=horizon) at which the projection drops below
    /// the alert threshold.
    fn time_to_threshold(&self, field: DecayField, current: f64) -> f64 {
        for hour in 1..=self.config.search_horizon_hours {
            let projected = self.decayed_value(field, current, hour as f64);
            if projected < self.config.alert_threshold {
                return hour as f64;
            }
        }
        f64::INFINITY
    }

    pub fn generate_predictions(&self, stance: &Stance) -> Vec<DecayPrediction> {
        let predictions: Vec<DecayPrediction> = DecayField::all()
            .map(|field| {
                let current = field.read(stance);
                let time_to_threshold = self.time_to_threshold(field, current);
                DecayPrediction {
                    field,
                    curve: field.curve(),
                    current_value: current,
                    half_life_hours: field.half_life_hours(),
                    projected_24h: self.decayed_value(field, current, 24.0),
                    projected_7d: self.decayed_value(field, current, 168.0),
                    time_to_threshold,
                    risk: RiskLevel::from_hours(time_to_threshold),
                }
            })
            .collect();
        debug!(
            at_risk = predictions.iter().filter(|p| p.risk != RiskLevel::Low).count(),
            "Generated decay predictions"
        );
        predictions
    }

    /// One entry per non-low prediction (most urgent first), plus a
    /// re-engagement nudge after prolonged inactivity.
    pub fn generate_recommendations(
        &self,
        predictions: &[DecayPrediction],
        last_activity: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Vec<DecayRecommendation> {
        let mut at_risk: Vec<&DecayPrediction> = predictions
            .iter()
            .filter(|p| p.risk != RiskLevel::Low)
            .collect();
        at_risk.sort_by(|a, b| a.time_to_threshold.total_cmp(&b.time_to_threshold));

        let mut out: Vec<DecayRecommendation> = at_risk
            .into_iter()
            .map(|p| {
                let action = match p.risk {
                    RiskLevel::Critical | RiskLevel::High => RecommendedAction::Reinforce,
                    _ => RecommendedAction::Monitor,
                };
                DecayRecommendation {
                    field: Some(p.field),
                    priority: p.risk,
                    action,
                    message: format!(
                        "{} ({:.1}) projected below {} within {}h on a {} curve",
                        p.field.name(),
                        p.current_value,
                        self.config.alert_threshold,
                        p.time_to_threshold,
                        p.curve.as_str()
                    ),
                }
            })
            .collect();

        let idle_hours = hours_between(last_activity, now);
        if idle_hours > self.config.inactivity_nudge_hours {
            out.push(DecayRecommendation {
                field: None,
                priority: RiskLevel::Medium,
                action: RecommendedAction::Reengage,
                message: format!(
                    "No activity for {:.0}h; start a session to reinforce the current stance",
                    idle_hours
                ),
            });
        }
        out
    }

    pub fn analyze(
        &self,
        stance: &Stance,
        last_activity: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DecayReport {
        let predictions = self.generate_predictions(stance);
        let recommendations = self.generate_recommendations(&predictions, last_activity, now);
        DecayReport {
            generated_at: now,
            hours_since_activity: hours_between(last_activity, now),
            predictions,
            recommendations,
        }
    }
}

/// Fractional hours from `from` to `to`, floored at zero.
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let ms = (to - from).num_milliseconds();
    (ms.max(0) as f64) / 3_600_000.0
}
