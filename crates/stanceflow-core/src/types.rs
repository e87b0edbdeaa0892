//! Conversation-level types: ids, messages, mode configuration

use crate::stance::{Frame, Objective, SelfModel, Stance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Conversation identifier - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ConversationId(Arc<str>);

impl ConversationId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    /// Fresh random id (UUID v4).
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ConversationId> for String {
    fn from(id: ConversationId) -> Self {
        id.0.to_string()
    }
}

/// Message role
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Per-conversation operating mode. Seeds the initial stance and bounds
/// how fast it may drift.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModeConfig {
    pub frame: Frame,
    pub self_model: SelfModel,
    pub objective: Objective,
    /// How strongly the persona leans into its frame (0-100).
    pub intensity: f64,
    /// Minimum acceptable coherence (0-100).
    pub coherence_floor: f64,
    /// Ceiling for sentience-oriented behaviour (0-100).
    pub sentience_level: f64,
    /// Drift magnitude above which a delta is truncated.
    pub max_drift_per_turn: f64,
    /// Cumulative drift allowed before a coherence reset.
    pub drift_budget: f64,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            frame: Frame::default(),
            self_model: SelfModel::default(),
            objective: Objective::default(),
            intensity: 50.0,
            coherence_floor: 30.0,
            sentience_level: 50.0,
            max_drift_per_turn: 20.0,
            drift_budget: 100.0,
        }
    }
}

impl ModeConfig {
    /// Starting stance for a conversation in this mode.
    pub fn initial_stance(&self) -> Stance {
        Stance {
            frame: self.frame,
            self_model: self.self_model,
            objective: self.objective,
            ..Stance::default()
        }
    }

    pub fn apply(&mut self, update: &ModeConfigUpdate) {
        if let Some(v) = update.frame {
            self.frame = v;
        }
        if let Some(v) = update.self_model {
            self.self_model = v;
        }
        if let Some(v) = update.objective {
            self.objective = v;
        }
        if let Some(v) = update.intensity {
            self.intensity = v;
        }
        if let Some(v) = update.coherence_floor {
            self.coherence_floor = v;
        }
        if let Some(v) = update.sentience_level {
            self.sentience_level = v;
        }
        if let Some(v) = update.max_drift_per_turn {
            self.max_drift_per_turn = v;
        }
        if let Some(v) = update.drift_budget {
            self.drift_budget = v;
        }
    }
}

/// Partial update of a `ModeConfig`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModeConfigUpdate {
    pub frame: Option<Frame>,
    pub self_model: Option<SelfModel>,
    pub objective: Option<Objective>,
    pub intensity: Option<f64>,
    pub coherence_floor: Option<f64>,
    pub sentience_level: Option<f64>,
    pub max_drift_per_turn: Option<f64>,
    pub drift_budget: Option<f64>,
}

/// A conversation and its current stance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub stance: Stance,
    #[serde(default)]
    pub config: ModeConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(config: ModeConfig) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::generate(),
            messages: Vec::new(),
            stance: config.initial_stance(),
            config,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
