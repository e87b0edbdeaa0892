//! Activity and per-field reinforcement timestamps.

use crate::curve::DecayField;
use crate::engine::hours_between;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTracker {
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub reinforced_at: BTreeMap<String, DateTime<Utc>>,
}

impl ActivityTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_activity: now,
            reinforced_at: BTreeMap::new(),
        }
    }

    pub fn record_activity(&mut self, at: DateTime<Utc>) {
        if at > self.last_activity {
            self.last_activity = at;
        }
    }

    /// Reinforcing a field also counts as activity.
    pub fn reinforce(&mut self, field: DecayField, at: DateTime<Utc>) {
        self.reinforced_at.insert(field.name().to_string(), at);
        self.record_activity(at);
    }

    pub fn last_reinforced(&self, field: DecayField) -> Option<DateTime<Utc>> {
        self.reinforced_at.get(field.name()).copied()
    }

    /// Hours since the field was reinforced, or since the last activity when
    /// it never was.
    pub fn hours_since_reinforced(&self, field: DecayField, now: DateTime<Utc>) -> f64 {
        let since = self.last_reinforced(field).unwrap_or(self.last_activity);
        hours_between(since, now)
    }
}
