//! Three-way stance merge with conflict resolution strategies.

use crate::diff::diff;
use crate::path::{FieldValue, StancePath};
use serde::{Deserialize, Serialize};
use stanceflow_core::{Result, Stance};
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Left side wins.
    Ours,
    /// Right side wins.
    Theirs,
    /// Numeric mean; non-numbers take the right side.
    Average,
    /// List set-union; non-lists take the right side.
    Union,
    /// Right side wins (last writer).
    #[default]
    Latest,
}

impl MergeStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeStrategy::Ours => "ours",
            MergeStrategy::Theirs => "theirs",
            MergeStrategy::Average => "average",
            MergeStrategy::Union => "union",
            MergeStrategy::Latest => "latest",
        }
    }

    /// Parse a strategy name; unknown names fall back to `latest`.
    pub fn parse_or_latest(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!("Unsupported merge strategy '{}', falling back to latest", name);
            MergeStrategy::Latest
        })
    }

    pub fn resolve(self, left: &FieldValue, right: &FieldValue) -> FieldValue {
        match (self, left, right) {
            (MergeStrategy::Ours, l, _) => l.clone(),
            (MergeStrategy::Average, FieldValue::Number(a), FieldValue::Number(b)) => {
                FieldValue::Number((a + b) / 2.0)
            }
            (MergeStrategy::Union, FieldValue::List(a), FieldValue::List(b)) => {
                let mut out = a.clone();
                for item in b {
                    if !out.contains(item) {
                        out.push(item.clone());
                    }
                }
                FieldValue::List(out)
            }
            (_, _, r) => r.clone(),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ours" => Ok(MergeStrategy::Ours),
            "theirs" => Ok(MergeStrategy::Theirs),
            "average" => Ok(MergeStrategy::Average),
            "union" => Ok(MergeStrategy::Union),
            "latest" => Ok(MergeStrategy::Latest),
            other => Err(format!("unknown merge strategy: {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConflict {
    pub path: StancePath,
    pub base_value: FieldValue,
    pub left_value: FieldValue,
    pub right_value: FieldValue,
    pub resolved_value: FieldValue,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub stance: Stance,
    pub strategy: MergeStrategy,
    pub conflicts: Vec<MergeConflict>,
}

impl MergeResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Merge `left` and `right`, both descended from `base`.
///
/// Paths changed on only one side take that side's value. Paths changed on
/// both sides to different values are conflicts resolved by `strategy`.
/// The result's version is one past the newer parent; its cumulative drift
/// is the mean of the parents' drift rather than a recomputed sum.
pub fn merge(base: &Stance, left: &Stance, right: &Stance, strategy: MergeStrategy) -> Result<MergeResult> {
    let left_paths = diff(base, left).changed_paths();
    let right_paths = diff(base, right).changed_paths();

    let mut stance = left.clone();
    let mut conflicts = Vec::new();

    for path in right_paths {
        let right_value = path.read(right);
        if !left_paths.contains(&path) {
            path.write(&mut stance, right_value)?;
            continue;
        }
        let left_value = path.read(left);
        if left_value == right_value {
            continue;
        }
        let resolved = strategy.resolve(&left_value, &right_value);
        path.write(&mut stance, resolved.clone())?;
        conflicts.push(MergeConflict {
            path,
            base_value: path.read(base),
            left_value,
            right_value,
            resolved_value: resolved,
        });
    }

    stance.version = left.version.max(right.version) + 1;
    stance.cumulative_drift = (left.cumulative_drift + right.cumulative_drift) / 2.0;
    stance.validate()?;

    debug!(
        strategy = strategy.as_str(),
        conflicts = conflicts.len(),
        version = stance.version,
        "Merged stances"
    );

    Ok(MergeResult {
        stance,
        strategy,
        conflicts,
    })
}

/// Paths whose values differ between two stances, ignoring bookkeeping.
pub fn differing_paths(a: &Stance, b: &Stance) -> Vec<StancePath> {
    StancePath::all()
        .into_iter()
        .filter(|p| p.read(a) != p.read(b))
        .collect()
}
