//! StanceController - conversation-scoped stance state with a drift budget
//!
//! Owned by the orchestration layer and passed by reference; there is no
//! process-wide instance. Mutations for one conversation id must be
//! serialized by the caller.

use crate::drift::{calculate_drift_magnitude, scale_delta, ScaledDelta};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use stanceflow_core::{
    Conversation, ConversationId, Error, Message, ModeConfig, ModeConfigUpdate, Result, Role,
    Stance, StanceDelta,
};
use tracing::{debug, info};

/// Everything that happened while evolving one stance by one delta.
#[derive(Clone, Debug, PartialEq)]
pub struct StanceTransition {
    pub stance: Stance,
    /// Raw magnitude of the proposed delta, before scaling.
    pub drift_magnitude: f64,
    pub scaled: ScaledDelta,
    /// The budget overflowed this turn and cumulative drift went back to 0.
    pub coherence_reset: bool,
}

/// Compute the stance that results from applying `delta` to `current`
/// under `config`. Pure; the controller stores the result.
///
/// The raw magnitude (not the truncated delta's) feeds cumulative drift and
/// the shift counter. Crossing the budget resets drift to zero rather than
/// carrying the overflow.
pub fn evolve(current: &Stance, delta: &StanceDelta, config: &ModeConfig) -> Result<StanceTransition> {
    let drift_magnitude = calculate_drift_magnitude(delta);
    let scaled = scale_delta(delta, drift_magnitude, config.max_drift_per_turn);
    let applied = &scaled.delta;

    let mut cumulative_drift = current.cumulative_drift + drift_magnitude;
    let coherence_reset = cumulative_drift > config.drift_budget;
    if coherence_reset {
        cumulative_drift = 0.0;
    }

    let turns_since_last_shift = if drift_magnitude > 0.0 {
        0
    } else {
        current.turns_since_last_shift.saturating_add(1)
    };

    let stance = Stance {
        frame: applied.frame.unwrap_or(current.frame),
        values: current.values.merged(applied.values.as_ref()),
        self_model: applied.self_model.unwrap_or(current.self_model),
        objective: applied.objective.unwrap_or(current.objective),
        metaphors: applied
            .metaphors
            .clone()
            .unwrap_or_else(|| current.metaphors.clone()),
        constraints: applied
            .constraints
            .clone()
            .unwrap_or_else(|| current.constraints.clone()),
        sentience: current.sentience.merged(applied.sentience.as_ref()),
        turns_since_last_shift,
        cumulative_drift,
        version: current.version + 1,
    };
    stance.validate()?;

    Ok(StanceTransition {
        stance,
        drift_magnitude,
        scaled,
        coherence_reset,
    })
}

/// Lightweight listing entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub message_count: usize,
    pub stance_version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct StanceController {
    conversations: DashMap<ConversationId, Conversation>,
}

impl Default for StanceController {
    fn default() -> Self {
        Self::new()
    }
}

impl StanceController {
    pub fn new() -> Self {
        Self {
            conversations: DashMap::new(),
        }
    }

    /// Start a conversation with a default stance seeded from `config`.
    pub fn create_conversation(&self, config: ModeConfig) -> Conversation {
        let conversation = Conversation::new(config);
        info!(
            "Conversation {} created (frame={}, budget={})",
            conversation.id,
            conversation.stance.frame.as_str(),
            conversation.config.drift_budget
        );
        self.conversations
            .insert(conversation.id.clone(), conversation.clone());
        conversation
    }

    pub fn get_conversation(&self, id: &ConversationId) -> Result<Conversation> {
        self.conversations
            .get(id)
            .map(|c| c.clone())
            .ok_or_else(|| Error::conversation_not_found(id.as_str()))
    }

    pub fn get_current_stance(&self, id: &ConversationId) -> Result<Stance> {
        self.conversations
            .get(id)
            .map(|c| c.stance.clone())
            .ok_or_else(|| Error::conversation_not_found(id.as_str()))
    }

    /// Apply a delta and return the new stance.
    pub fn apply_delta(&self, id: &ConversationId, delta: &StanceDelta) -> Result<Stance> {
        self.apply_delta_detailed(id, delta).map(|t| t.stance)
    }

    /// Like `apply_delta`, but also reports magnitude, truncation, and
    /// whether a coherence reset occurred.
    pub fn apply_delta_detailed(
        &self,
        id: &ConversationId,
        delta: &StanceDelta,
    ) -> Result<StanceTransition> {
        let mut entry = self
            .conversations
            .get_mut(id)
            .ok_or_else(|| Error::conversation_not_found(id.as_str()))?;
        let conversation = entry.value_mut();

        let transition = evolve(&conversation.stance, delta, &conversation.config)?;

        if transition.coherence_reset {
            info!(
                "Conversation {} coherence reset: drift {} + {} exceeded budget {}",
                id,
                conversation.stance.cumulative_drift,
                transition.drift_magnitude,
                conversation.config.drift_budget
            );
        }
        debug!(
            conversation = %id,
            magnitude = transition.drift_magnitude,
            truncated = transition.scaled.truncated,
            version = transition.stance.version,
            "Applied stance delta"
        );

        conversation.stance = transition.stance.clone();
        conversation.touch();
        Ok(transition)
    }

    pub fn add_message(&self, id: &ConversationId, role: Role, content: &str) -> Result<Message> {
        let mut entry = self
            .conversations
            .get_mut(id)
            .ok_or_else(|| Error::conversation_not_found(id.as_str()))?;
        let message = Message::new(role, content);
        entry.messages.push(message.clone());
        entry.touch();
        Ok(message)
    }

    pub fn get_history(&self, id: &ConversationId) -> Result<Vec<Message>> {
        self.conversations
            .get(id)
            .map(|c| c.messages.clone())
            .ok_or_else(|| Error::conversation_not_found(id.as_str()))
    }

    /// Patch the mode config. Affects subsequent deltas only; the current
    /// stance is left as-is.
    pub fn update_config(&self, id: &ConversationId, update: &ModeConfigUpdate) -> Result<ModeConfig> {
        let mut entry = self
            .conversations
            .get_mut(id)
            .ok_or_else(|| Error::conversation_not_found(id.as_str()))?;
        entry.config.apply(update);
        entry.touch();
        Ok(entry.config.clone())
    }

    /// Serialize a conversation to pretty JSON. Dates are RFC 3339.
    pub fn export_conversation(&self, id: &ConversationId) -> Result<String> {
        let entry = self
            .conversations
            .get(id)
            .ok_or_else(|| Error::conversation_not_found(id.as_str()))?;
        Ok(serde_json::to_string_pretty(entry.value())?)
    }

    /// Parse an exported conversation and register it, replacing any
    /// conversation with the same id. Values are not re-validated here;
    /// the next `apply_delta` re-clamps them.
    pub fn import_conversation(&self, json: &str) -> Result<ConversationId> {
        let conversation: Conversation = serde_json::from_str(json)?;
        let id = conversation.id.clone();
        let replaced = self.conversations.insert(id.clone(), conversation).is_some();
        info!(
            "Conversation {} imported{}",
            id,
            if replaced { " (replaced existing)" } else { "" }
        );
        Ok(id)
    }

    /// Register an already-built conversation.
    pub fn insert_conversation(&self, conversation: Conversation) -> ConversationId {
        let id = conversation.id.clone();
        self.conversations.insert(id.clone(), conversation);
        id
    }

    /// All conversations, oldest first.
    pub fn list_conversations(&self) -> Vec<ConversationSummary> {
        let mut out: Vec<ConversationSummary> = self
            .conversations
            .iter()
            .map(|e| ConversationSummary {
                id: e.id.clone(),
                message_count: e.messages.len(),
                stance_version: e.stance.version,
                created_at: e.created_at,
                updated_at: e.updated_at,
            })
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Returns whether a conversation was removed.
    pub fn delete_conversation(&self, id: &ConversationId) -> bool {
        let removed = self.conversations.remove(id).is_some();
        if removed {
            info!("Conversation {} deleted", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
