//! Checkpoint and branch records stored in a history arena.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stanceflow_core::Stance;
use std::sync::Arc;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_MAX_CHECKPOINTS_PER_BRANCH: usize = 100;

/// Checkpoint identifier - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CheckpointId(Arc<str>);

impl CheckpointId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CheckpointId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for CheckpointId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<CheckpointId> for String {
    fn from(id: CheckpointId) -> Self {
        id.0.to_string()
    }
}

/// An immutable stance snapshot in the history DAG.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: CheckpointId,
    #[serde(default)]
    pub parent_id: Option<CheckpointId>,
    /// Second parent, set only on merge commits.
    #[serde(default)]
    pub merge_parent_id: Option<CheckpointId>,
    /// Branch the checkpoint was committed on.
    pub branch: String,
    pub stance: Stance,
    #[serde(default)]
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A named pointer into the history plus the checkpoints committed on it,
/// oldest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub head: Option<CheckpointId>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointId>,
    #[serde(default)]
    pub forked_from: Option<CheckpointId>,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    pub fn new(name: impl Into<String>, forked_from: Option<CheckpointId>) -> Self {
        Self {
            name: name.into(),
            head: forked_from.clone(),
            checkpoints: Vec::new(),
            forked_from,
            created_at: Utc::now(),
        }
    }

    /// Whether this branch points at `id` through its list, head, or fork point.
    pub fn references(&self, id: &CheckpointId) -> bool {
        self.head.as_ref() == Some(id)
            || self.forked_from.as_ref() == Some(id)
            || self.checkpoints.contains(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RollbackConfig {
    pub max_checkpoints_per_branch: usize,
    pub default_branch: String,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            max_checkpoints_per_branch: DEFAULT_MAX_CHECKPOINTS_PER_BRANCH,
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}
