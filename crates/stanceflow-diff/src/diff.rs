//! Structural diff between two stance snapshots.

use crate::path::{FieldValue, StancePath};
use serde::Serialize;
use stanceflow_core::Stance;
use std::collections::BTreeSet;

/// Value changes above this are major.
pub const MAJOR_VALUE_DELTA: f64 = 20.0;
/// Value changes above this (and not major) are moderate.
pub const MODERATE_VALUE_DELTA: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Minor,
    Moderate,
    Major,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffChange {
    pub path: StancePath,
    pub kind: ChangeKind,
    pub left_value: Option<FieldValue>,
    pub right_value: Option<FieldValue>,
    pub significance: Significance,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub total: usize,
    pub major: usize,
    pub moderate: usize,
    pub minor: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StanceDiff {
    pub left_version: u64,
    pub right_version: u64,
    pub changes: Vec<DiffChange>,
    pub summary: DiffSummary,
}

impl StanceDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Paths touched by at least one change.
    pub fn changed_paths(&self) -> BTreeSet<StancePath> {
        self.changes.iter().map(|c| c.path).collect()
    }

    pub fn highest_significance(&self) -> Option<Significance> {
        self.changes.iter().map(|c| c.significance).max()
    }
}

fn value_significance(delta: f64) -> Significance {
    let magnitude = delta.abs();
    if magnitude > MAJOR_VALUE_DELTA {
        Significance::Major
    } else if magnitude > MODERATE_VALUE_DELTA {
        Significance::Moderate
    } else {
        Significance::Minor
    }
}

fn modified(path: StancePath, left: FieldValue, right: FieldValue, significance: Significance) -> DiffChange {
    DiffChange {
        path,
        kind: ChangeKind::Modified,
        left_value: Some(left),
        right_value: Some(right),
        significance,
    }
}

/// Entries of `a` missing from `b`, first occurrence only.
fn missing_from(a: &[String], b: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    a.iter()
        .filter(|item| !b.contains(item) && seen.insert(item.as_str()))
        .cloned()
        .collect()
}

/// Field-by-field comparison, in `StancePath::all()` order.
pub fn diff(left: &Stance, right: &Stance) -> StanceDiff {
    let mut changes = Vec::new();

    for path in StancePath::all() {
        let l = path.read(left);
        let r = path.read(right);
        if l == r {
            continue;
        }
        match (l, r) {
            (FieldValue::Number(a), FieldValue::Number(b)) => {
                let significance = match path {
                    StancePath::Value(_) => value_significance(b - a),
                    _ => Significance::Moderate,
                };
                changes.push(modified(path, FieldValue::Number(a), FieldValue::Number(b), significance));
            }
            (FieldValue::List(a), FieldValue::List(b)) => {
                for item in missing_from(&b, &a) {
                    changes.push(DiffChange {
                        path,
                        kind: ChangeKind::Added,
                        left_value: None,
                        right_value: Some(FieldValue::Text(item)),
                        significance: Significance::Moderate,
                    });
                }
                for item in missing_from(&a, &b) {
                    changes.push(DiffChange {
                        path,
                        kind: ChangeKind::Removed,
                        left_value: Some(FieldValue::Text(item)),
                        right_value: None,
                        significance: Significance::Moderate,
                    });
                }
            }
            (l, r) => {
                let significance = match path {
                    StancePath::Frame | StancePath::SelfModel => Significance::Major,
                    _ => Significance::Moderate,
                };
                changes.push(modified(path, l, r, significance));
            }
        }
    }

    let summary = DiffSummary {
        total: changes.len(),
        major: changes.iter().filter(|c| c.significance == Significance::Major).count(),
        moderate: changes.iter().filter(|c| c.significance == Significance::Moderate).count(),
        minor: changes.iter().filter(|c| c.significance == Significance::Minor).count(),
    };

    StanceDiff {
        left_version: left.version,
        right_version: right.version,
        changes,
        summary,
    }
}
