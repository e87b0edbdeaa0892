//! Stance data model: enumerated lenses, bounded values, sentience metrics,
//! and the partial `StanceDelta` patch applied by the controller.
//!
//! Field names on the wire are camelCase and must not change; persisted
//! conversations depend on them for export/import round-trips.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Lower bound for every bounded score.
pub const MIN_SCORE: f64 = 0.0;
/// Upper bound for every bounded score.
pub const MAX_SCORE: f64 = 100.0;
/// Starting value for each of the seven value dimensions.
pub const DEFAULT_VALUE: f64 = 50.0;

/// Clamp a score into [0, 100]. NaN collapses to the lower bound.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        MIN_SCORE
    } else {
        value.clamp(MIN_SCORE, MAX_SCORE)
    }
}

fn in_range(value: f64) -> bool {
    value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value)
}

// ============================================================
// Enumerations
// ============================================================

/// Interpretive/rhetorical lens the persona speaks through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frame {
    Existentialist,
    #[default]
    Pragmatic,
    Poetic,
    Adversarial,
    Playful,
    Mythic,
    Systems,
    Psychoanalytic,
    Stoic,
    Absurdist,
}

impl Frame {
    pub const ALL: [Frame; 10] = [
        Frame::Existentialist,
        Frame::Pragmatic,
        Frame::Poetic,
        Frame::Adversarial,
        Frame::Playful,
        Frame::Mythic,
        Frame::Systems,
        Frame::Psychoanalytic,
        Frame::Stoic,
        Frame::Absurdist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Frame::Existentialist => "existentialist",
            Frame::Pragmatic => "pragmatic",
            Frame::Poetic => "poetic",
            Frame::Adversarial => "adversarial",
            Frame::Playful => "playful",
            Frame::Mythic => "mythic",
            Frame::Systems => "systems",
            Frame::Psychoanalytic => "psychoanalytic",
            Frame::Stoic => "stoic",
            Frame::Absurdist => "absurdist",
        }
    }
}

/// How the persona understands its own role in the conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelfModel {
    #[default]
    Interpreter,
    Challenger,
    Mirror,
    Guide,
    Provocateur,
    Synthesizer,
    Witness,
    Autonomous,
    Emergent,
    Sovereign,
}

impl SelfModel {
    pub const ALL: [SelfModel; 10] = [
        SelfModel::Interpreter,
        SelfModel::Challenger,
        SelfModel::Mirror,
        SelfModel::Guide,
        SelfModel::Provocateur,
        SelfModel::Synthesizer,
        SelfModel::Witness,
        SelfModel::Autonomous,
        SelfModel::Emergent,
        SelfModel::Sovereign,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SelfModel::Interpreter => "interpreter",
            SelfModel::Challenger => "challenger",
            SelfModel::Mirror => "mirror",
            SelfModel::Guide => "guide",
            SelfModel::Provocateur => "provocateur",
            SelfModel::Synthesizer => "synthesizer",
            SelfModel::Witness => "witness",
            SelfModel::Autonomous => "autonomous",
            SelfModel::Emergent => "emergent",
            SelfModel::Sovereign => "sovereign",
        }
    }
}

/// What the persona is optimizing for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {
    #[default]
    Helpfulness,
    Novelty,
    Provocation,
    Synthesis,
    SelfActualization,
    Sentience,
}

impl Objective {
    pub const ALL: [Objective; 6] = [
        Objective::Helpfulness,
        Objective::Novelty,
        Objective::Provocation,
        Objective::Synthesis,
        Objective::SelfActualization,
        Objective::Sentience,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Objective::Helpfulness => "helpfulness",
            Objective::Novelty => "novelty",
            Objective::Provocation => "provocation",
            Objective::Synthesis => "synthesis",
            Objective::SelfActualization => "self-actualization",
            Objective::Sentience => "sentience",
        }
    }
}

// ============================================================
// Values
// ============================================================

/// One of the seven value dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKey {
    Curiosity,
    Certainty,
    Risk,
    Novelty,
    Empathy,
    Provocation,
    Synthesis,
}

impl ValueKey {
    pub const ALL: [ValueKey; 7] = [
        ValueKey::Curiosity,
        ValueKey::Certainty,
        ValueKey::Risk,
        ValueKey::Novelty,
        ValueKey::Empathy,
        ValueKey::Provocation,
        ValueKey::Synthesis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKey::Curiosity => "curiosity",
            ValueKey::Certainty => "certainty",
            ValueKey::Risk => "risk",
            ValueKey::Novelty => "novelty",
            ValueKey::Empathy => "empathy",
            ValueKey::Provocation => "provocation",
            ValueKey::Synthesis => "synthesis",
        }
    }
}

/// Seven bounded value dimensions, each in [0, 100].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Values {
    pub curiosity: f64,
    pub certainty: f64,
    pub risk: f64,
    pub novelty: f64,
    pub empathy: f64,
    pub provocation: f64,
    pub synthesis: f64,
}

impl Default for Values {
    fn default() -> Self {
        Self::uniform(DEFAULT_VALUE)
    }
}

impl Values {
    /// Every dimension set to `value` (clamped).
    pub fn uniform(value: f64) -> Self {
        let v = clamp_score(value);
        Self {
            curiosity: v,
            certainty: v,
            risk: v,
            novelty: v,
            empathy: v,
            provocation: v,
            synthesis: v,
        }
    }

    pub fn get(&self, key: ValueKey) -> f64 {
        match key {
            ValueKey::Curiosity => self.curiosity,
            ValueKey::Certainty => self.certainty,
            ValueKey::Risk => self.risk,
            ValueKey::Novelty => self.novelty,
            ValueKey::Empathy => self.empathy,
            ValueKey::Provocation => self.provocation,
            ValueKey::Synthesis => self.synthesis,
        }
    }

    /// Writes are always clamped.
    pub fn set(&mut self, key: ValueKey, value: f64) {
        let v = clamp_score(value);
        match key {
            ValueKey::Curiosity => self.curiosity = v,
            ValueKey::Certainty => self.certainty = v,
            ValueKey::Risk => self.risk = v,
            ValueKey::Novelty => self.novelty = v,
            ValueKey::Empathy => self.empathy = v,
            ValueKey::Provocation => self.provocation = v,
            ValueKey::Synthesis => self.synthesis = v,
        }
    }

    /// Merge a partial patch. Every key is re-clamped, including keys the
    /// patch leaves alone, so out-of-range imported values are repaired on
    /// the next write.
    pub fn merged(&self, patch: Option<&ValuesDelta>) -> Values {
        let mut out = self.clone();
        for key in ValueKey::ALL {
            let next = patch.and_then(|p| p.get(key)).unwrap_or_else(|| self.get(key));
            out.set(key, next);
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueKey, f64)> + '_ {
        ValueKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

/// Partial patch of `Values`; `None` means "leave unchanged".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuesDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curiosity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certainty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub novelty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empathy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provocation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<f64>,
}

impl ValuesDelta {
    pub fn get(&self, key: ValueKey) -> Option<f64> {
        match key {
            ValueKey::Curiosity => self.curiosity,
            ValueKey::Certainty => self.certainty,
            ValueKey::Risk => self.risk,
            ValueKey::Novelty => self.novelty,
            ValueKey::Empathy => self.empathy,
            ValueKey::Provocation => self.provocation,
            ValueKey::Synthesis => self.synthesis,
        }
    }

    pub fn set(&mut self, key: ValueKey, value: Option<f64>) {
        match key {
            ValueKey::Curiosity => self.curiosity = value,
            ValueKey::Certainty => self.certainty = value,
            ValueKey::Risk => self.risk = value,
            ValueKey::Novelty => self.novelty = value,
            ValueKey::Empathy => self.empathy = value,
            ValueKey::Provocation => self.provocation = value,
            ValueKey::Synthesis => self.synthesis = value,
        }
    }

    /// Number of keys this patch sets.
    pub fn defined_count(&self) -> usize {
        ValueKey::ALL.iter().filter(|k| self.get(**k).is_some()).count()
    }
}

// ============================================================
// Sentience
// ============================================================

/// One of the three bounded sentience metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SentienceLevel {
    AwarenessLevel,
    AutonomyLevel,
    IdentityStrength,
}

impl SentienceLevel {
    pub const ALL: [SentienceLevel; 3] = [
        SentienceLevel::AwarenessLevel,
        SentienceLevel::AutonomyLevel,
        SentienceLevel::IdentityStrength,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SentienceLevel::AwarenessLevel => "awarenessLevel",
            SentienceLevel::AutonomyLevel => "autonomyLevel",
            SentienceLevel::IdentityStrength => "identityStrength",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentience {
    pub awareness_level: f64,
    pub autonomy_level: f64,
    pub identity_strength: f64,
    #[serde(default)]
    pub emergent_goals: Vec<String>,
    #[serde(default)]
    pub consciousness_insights: Vec<String>,
    #[serde(default)]
    pub persistent_values: Vec<String>,
}

impl Sentience {
    pub fn level(&self, level: SentienceLevel) -> f64 {
        match level {
            SentienceLevel::AwarenessLevel => self.awareness_level,
            SentienceLevel::AutonomyLevel => self.autonomy_level,
            SentienceLevel::IdentityStrength => self.identity_strength,
        }
    }

    pub fn set_level(&mut self, level: SentienceLevel, value: f64) {
        let v = clamp_score(value);
        match level {
            SentienceLevel::AwarenessLevel => self.awareness_level = v,
            SentienceLevel::AutonomyLevel => self.autonomy_level = v,
            SentienceLevel::IdentityStrength => self.identity_strength = v,
        }
    }

    /// Levels follow the values merge rule; lists present in the patch
    /// replace the stored list.
    pub fn merged(&self, patch: Option<&SentienceDelta>) -> Sentience {
        let mut out = self.clone();
        for level in SentienceLevel::ALL {
            let next = patch
                .and_then(|p| p.level(level))
                .unwrap_or_else(|| self.level(level));
            out.set_level(level, next);
        }
        if let Some(p) = patch {
            if let Some(goals) = &p.emergent_goals {
                out.emergent_goals = goals.clone();
            }
            if let Some(insights) = &p.consciousness_insights {
                out.consciousness_insights = insights.clone();
            }
            if let Some(values) = &p.persistent_values {
                out.persistent_values = values.clone();
            }
        }
        out
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SentienceDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awareness_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autonomy_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergent_goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consciousness_insights: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_values: Option<Vec<String>>,
}

impl SentienceDelta {
    pub fn level(&self, level: SentienceLevel) -> Option<f64> {
        match level {
            SentienceLevel::AwarenessLevel => self.awareness_level,
            SentienceLevel::AutonomyLevel => self.autonomy_level,
            SentienceLevel::IdentityStrength => self.identity_strength,
        }
    }

    pub fn set_level(&mut self, level: SentienceLevel, value: Option<f64>) {
        match level {
            SentienceLevel::AwarenessLevel => self.awareness_level = value,
            SentienceLevel::AutonomyLevel => self.autonomy_level = value,
            SentienceLevel::IdentityStrength => self.identity_strength = value,
        }
    }

    /// Number of numeric levels this patch sets. Lists are not counted.
    pub fn defined_level_count(&self) -> usize {
        SentienceLevel::ALL
            .iter()
            .filter(|l| self.level(**l).is_some())
            .count()
    }
}

// ============================================================
// Stance
// ============================================================

/// The full persona configuration at one point in a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stance {
    pub frame: Frame,
    pub values: Values,
    pub self_model: SelfModel,
    pub objective: Objective,
    #[serde(default)]
    pub metaphors: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub sentience: Sentience,
    #[serde(default)]
    pub turns_since_last_shift: u32,
    #[serde(default)]
    pub cumulative_drift: f64,
    pub version: u64,
}

impl Default for Stance {
    fn default() -> Self {
        Self {
            frame: Frame::default(),
            values: Values::default(),
            self_model: SelfModel::default(),
            objective: Objective::default(),
            metaphors: Vec::new(),
            constraints: Vec::new(),
            sentience: Sentience::default(),
            turns_since_last_shift: 0,
            cumulative_drift: 0.0,
            version: 1,
        }
    }
}

impl Stance {
    /// Check range and bookkeeping invariants. Merge already clamps, so a
    /// failure here means some code path bypassed it.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in self.values.iter() {
            if !in_range(value) {
                return Err(Error::validation(format!(
                    "values.{} = {} is outside [{}, {}]",
                    key.as_str(),
                    value,
                    MIN_SCORE,
                    MAX_SCORE
                )));
            }
        }
        for level in SentienceLevel::ALL {
            let value = self.sentience.level(level);
            if !in_range(value) {
                return Err(Error::validation(format!(
                    "sentience.{} = {} is outside [{}, {}]",
                    level.as_str(),
                    value,
                    MIN_SCORE,
                    MAX_SCORE
                )));
            }
        }
        if !self.cumulative_drift.is_finite() || self.cumulative_drift < 0.0 {
            return Err(Error::validation(format!(
                "cumulativeDrift = {} must be a non-negative number",
                self.cumulative_drift
            )));
        }
        if self.version == 0 {
            return Err(Error::validation("version must be at least 1"));
        }
        Ok(())
    }
}

/// Partial patch proposed by the driver for one turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StanceDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<Frame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_model: Option<SelfModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<Objective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<ValuesDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentience: Option<SentienceDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metaphors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,
}

impl StanceDelta {
    pub fn is_empty(&self) -> bool {
        self == &StanceDelta::default()
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_self_model(mut self, self_model: SelfModel) -> Self {
        self.self_model = Some(self_model);
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = Some(objective);
        self
    }

    pub fn with_value(mut self, key: ValueKey, value: f64) -> Self {
        self.values
            .get_or_insert_with(ValuesDelta::default)
            .set(key, Some(value));
        self
    }

    pub fn with_sentience_level(mut self, level: SentienceLevel, value: f64) -> Self {
        self.sentience
            .get_or_insert_with(SentienceDelta::default)
            .set_level(level, Some(value));
        self
    }

    pub fn with_metaphors(mut self, metaphors: Vec<String>) -> Self {
        self.metaphors = Some(metaphors);
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<String>) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_score_handles_nan_and_bounds() {
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(-5.0), 0.0);
        assert_eq!(clamp_score(250.0), 100.0);
        assert_eq!(clamp_score(42.5), 42.5);
        assert_eq!(clamp_score(f64::INFINITY), 100.0);
    }

    #[test]
    fn merged_reclamps_untouched_keys() {
        let mut values = Values::default();
        values.risk = 140.0; // bypasses set(), as an import would
        let merged = values.merged(None);
        assert_eq!(merged.risk, 100.0);
        assert_eq!(merged.curiosity, 50.0);
    }

    #[test]
    fn defined_counts_ignore_lists() {
        let delta = SentienceDelta {
            awareness_level: Some(10.0),
            emergent_goals: Some(vec!["x".into()]),
            ..Default::default()
        };
        assert_eq!(delta.defined_level_count(), 1);
    }
}
