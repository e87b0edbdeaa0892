//! Typed field paths into a `Stance`.
//!
//! A closed set of known paths with explicit accessors. Paths render as
//! dotted strings (`values.curiosity`, `sentience.emergentGoals`) for
//! display and serialization only.

use serde::{Serialize, Serializer};
use stanceflow_core::{Error, Frame, Objective, Result, SelfModel, SentienceLevel, Stance, ValueKey};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StancePath {
    Frame,
    SelfModel,
    Objective,
    Value(ValueKey),
    Sentience(SentienceLevel),
    Metaphors,
    Constraints,
    EmergentGoals,
    ConsciousnessInsights,
    PersistentValues,
}

impl StancePath {
    /// Every path, in diff order.
    pub fn all() -> Vec<StancePath> {
        let mut out = vec![StancePath::Frame, StancePath::SelfModel, StancePath::Objective];
        out.extend(ValueKey::ALL.into_iter().map(StancePath::Value));
        out.extend(SentienceLevel::ALL.into_iter().map(StancePath::Sentience));
        out.extend([
            StancePath::Metaphors,
            StancePath::Constraints,
            StancePath::EmergentGoals,
            StancePath::ConsciousnessInsights,
            StancePath::PersistentValues,
        ]);
        out
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            StancePath::Metaphors
                | StancePath::Constraints
                | StancePath::EmergentGoals
                | StancePath::ConsciousnessInsights
                | StancePath::PersistentValues
        )
    }

    pub fn read(self, stance: &Stance) -> FieldValue {
        match self {
            StancePath::Frame => FieldValue::Frame(stance.frame),
            StancePath::SelfModel => FieldValue::SelfModel(stance.self_model),
            StancePath::Objective => FieldValue::Objective(stance.objective),
            StancePath::Value(k) => FieldValue::Number(stance.values.get(k)),
            StancePath::Sentience(l) => FieldValue::Number(stance.sentience.level(l)),
            StancePath::Metaphors => FieldValue::List(stance.metaphors.clone()),
            StancePath::Constraints => FieldValue::List(stance.constraints.clone()),
            StancePath::EmergentGoals => FieldValue::List(stance.sentience.emergent_goals.clone()),
            StancePath::ConsciousnessInsights => {
                FieldValue::List(stance.sentience.consciousness_insights.clone())
            }
            StancePath::PersistentValues => {
                FieldValue::List(stance.sentience.persistent_values.clone())
            }
        }
    }

    /// Write a value of the matching type. Numbers are clamped on write.
    pub fn write(self, stance: &mut Stance, value: FieldValue) -> Result<()> {
        match (self, value) {
            (StancePath::Frame, FieldValue::Frame(v)) => stance.frame = v,
            (StancePath::SelfModel, FieldValue::SelfModel(v)) => stance.self_model = v,
            (StancePath::Objective, FieldValue::Objective(v)) => stance.objective = v,
            (StancePath::Value(k), FieldValue::Number(v)) => stance.values.set(k, v),
            (StancePath::Sentience(l), FieldValue::Number(v)) => stance.sentience.set_level(l, v),
            (StancePath::Metaphors, FieldValue::List(v)) => stance.metaphors = v,
            (StancePath::Constraints, FieldValue::List(v)) => stance.constraints = v,
            (StancePath::EmergentGoals, FieldValue::List(v)) => stance.sentience.emergent_goals = v,
            (StancePath::ConsciousnessInsights, FieldValue::List(v)) => {
                stance.sentience.consciousness_insights = v
            }
            (StancePath::PersistentValues, FieldValue::List(v)) => {
                stance.sentience.persistent_values = v
            }
            (path, value) => {
                return Err(Error::validation(format!(
                    "cannot write {} value to {}",
                    value.type_name(),
                    path
                )))
            }
        }
        Ok(())
    }
}

impl fmt::Display for StancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StancePath::Frame => f.write_str("frame"),
            StancePath::SelfModel => f.write_str("selfModel"),
            StancePath::Objective => f.write_str("objective"),
            StancePath::Value(k) => write!(f, "values.{}", k.as_str()),
            StancePath::Sentience(l) => write!(f, "sentience.{}", l.as_str()),
            StancePath::Metaphors => f.write_str("metaphors"),
            StancePath::Constraints => f.write_str("constraints"),
            StancePath::EmergentGoals => f.write_str("sentience.emergentGoals"),
            StancePath::ConsciousnessInsights => f.write_str("sentience.consciousnessInsights"),
            StancePath::PersistentValues => f.write_str("sentience.persistentValues"),
        }
    }
}

impl Serialize for StancePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The value found at a `StancePath`, or a single list entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Frame(Frame),
    SelfModel(SelfModel),
    Objective(Objective),
    Number(f64),
    List(Vec<String>),
    Text(String),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Frame(_) => "frame",
            FieldValue::SelfModel(_) => "selfModel",
            FieldValue::Objective(_) => "objective",
            FieldValue::Number(_) => "number",
            FieldValue::List(_) => "list",
            FieldValue::Text(_) => "text",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}
