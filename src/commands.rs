//! File-level operations behind the `stanceflow` subcommands.
//!
//! Conversation arguments are either a path to an exported conversation
//! or an id in the conversation store. Stance arguments accept a bare
//! stance or a whole conversation (its current stance is used).

use crate::config::StanceflowConfig;
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use stanceflow_controller::{ConversationStore, StanceController};
use stanceflow_core::{Conversation, ConversationId, Stance, StanceDelta};
use stanceflow_decay::{DecayEngine, DecayReport};
use stanceflow_diff::StanceDiff;
use stanceflow_rollback::{CheckpointId, StanceHistory};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a conversation argument resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationSource {
    File(PathBuf),
    Stored(ConversationId),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub conversation_id: ConversationId,
    pub stance: Stance,
    pub drift_magnitude: f64,
    pub truncated: bool,
    pub coherence_reset: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<CheckpointId>,
    #[serde(skip)]
    pub saved_to: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayOutput {
    pub hours: f64,
    pub projected: Stance,
    pub report: DecayReport,
}

pub struct Workspace {
    config: StanceflowConfig,
    store: ConversationStore,
}

impl Workspace {
    pub fn open(config: StanceflowConfig, store_dir: &Path) -> anyhow::Result<Self> {
        config.validate()?;
        let store = ConversationStore::open(store_dir)
            .with_context(|| format!("opening store at {}", store_dir.display()))?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &StanceflowConfig {
        &self.config
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn locate(&self, arg: &str) -> ConversationSource {
        let path = Path::new(arg);
        if path.exists() {
            ConversationSource::File(path.to_path_buf())
        } else {
            ConversationSource::Stored(ConversationId::new(arg))
        }
    }

    fn read_conversation_json(&self, source: &ConversationSource) -> anyhow::Result<String> {
        match source {
            ConversationSource::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display())),
            ConversationSource::Stored(id) => {
                let conversation = self.store.load(id)?;
                Ok(serde_json::to_string(&conversation)?)
            }
        }
    }

    fn write_conversation(
        &self,
        source: &ConversationSource,
        conversation: &Conversation,
    ) -> anyhow::Result<PathBuf> {
        match source {
            ConversationSource::File(path) => {
                write_atomic(path, &serde_json::to_string_pretty(conversation)?)?;
                Ok(path.clone())
            }
            ConversationSource::Stored(_) => Ok(self.store.save(conversation)?),
        }
    }

    /// Create a conversation from the configured mode. Written to `out` when
    /// given, otherwise into the store.
    pub fn new_conversation(&self, out: Option<&Path>) -> anyhow::Result<(Conversation, PathBuf)> {
        let controller = StanceController::new();
        let conversation = controller.create_conversation(self.config.mode.clone());
        let path = match out {
            Some(path) => {
                write_atomic(path, &controller.export_conversation(&conversation.id)?)?;
                path.to_path_buf()
            }
            None => self.store.save(&conversation)?,
        };
        info!("New conversation {} at {}", conversation.id, path.display());
        Ok((conversation, path))
    }

    /// Apply one delta to a conversation, persist it, and optionally commit
    /// the resulting stance to a history file.
    pub fn apply(
        &self,
        conversation: &str,
        delta: &str,
        checkpoint: Option<&Path>,
        message: Option<&str>,
    ) -> anyhow::Result<ApplyOutcome> {
        let source = self.locate(conversation);
        let json = self.read_conversation_json(&source)?;
        let delta = parse_delta(delta)?;

        let controller = StanceController::new();
        let id = controller.import_conversation(&json)?;
        if let ConversationSource::Stored(stored) = &source {
            if stored != &id {
                bail!("stored conversation {} carries id {}", stored, id);
            }
        }
        let history = match checkpoint {
            Some(path) => {
                let history =
                    StanceHistory::load_or_new(path, id.clone(), self.config.rollback.clone())
                        .with_context(|| format!("loading history {}", path.display()))?;
                if history.conversation_id() != &id {
                    bail!(
                        "history {} belongs to conversation {}, not {}",
                        path.display(),
                        history.conversation_id(),
                        id
                    );
                }
                Some((path, history))
            }
            None => None,
        };

        let transition = controller.apply_delta_detailed(&id, &delta)?;
        let saved_to = self.write_conversation(&source, &controller.get_conversation(&id)?)?;

        let checkpoint_id = match history {
            Some((path, mut history)) => {
                let message = message
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("stance v{}", transition.stance.version));
                let checkpoint_id = history.commit(transition.stance.clone(), message)?;
                history.save(path)?;
                Some(checkpoint_id)
            }
            None => None,
        };

        Ok(ApplyOutcome {
            conversation_id: id,
            stance: transition.stance,
            drift_magnitude: transition.drift_magnitude,
            truncated: transition.scaled.truncated,
            coherence_reset: transition.coherence_reset,
            checkpoint_id,
            saved_to,
        })
    }

    pub fn diff(&self, left: &Path, right: &Path) -> anyhow::Result<StanceDiff> {
        let (left, _) = read_stance(left)?;
        let (right, _) = read_stance(right)?;
        Ok(stanceflow_diff::diff(&left, &right))
    }

    /// Project a stance `hours` ahead and report decay risk. For a
    /// conversation file the last update counts as the last activity.
    pub fn decay(&self, stance: &Path, hours: f64) -> anyhow::Result<DecayOutput> {
        if !hours.is_finite() || hours < 0.0 {
            bail!("hours must be a non-negative number, got {}", hours);
        }
        let (stance, last_activity) = read_stance(stance)?;
        let engine = DecayEngine::new(self.config.decay.clone());
        let now = Utc::now();
        let last_activity = match last_activity {
            Some(at) => at,
            None => Duration::try_seconds((hours * 3600.0) as i64)
                .and_then(|idle| now.checked_sub_signed(idle))
                .with_context(|| format!("hours {} is out of range", hours))?,
        };

        Ok(DecayOutput {
            hours,
            projected: engine.project(&stance, hours),
            report: engine.analyze(&stance, last_activity, now),
        })
    }

    pub fn rollback(&self, history: &Path, steps: usize) -> anyhow::Result<Stance> {
        let mut loaded = StanceHistory::load(history)
            .with_context(|| format!("loading history {}", history.display()))?;
        let stance = loaded.rollback(steps)?.clone();
        loaded.save(history)?;
        Ok(stance)
    }
}

/// A delta given inline as JSON or as a path to a JSON file.
pub fn parse_delta(arg: &str) -> anyhow::Result<StanceDelta> {
    let trimmed = arg.trim_start();
    let json = if trimmed.starts_with('{') {
        arg.to_string()
    } else {
        std::fs::read_to_string(arg).with_context(|| format!("reading delta {}", arg))?
    };
    serde_json::from_str(&json).with_context(|| format!("parsing delta {}", arg))
}

/// Read a stance file, or a conversation file's current stance plus its
/// last update time.
pub fn read_stance(path: &Path) -> anyhow::Result<(Stance, Option<DateTime<Utc>>)> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    if value.get("stance").is_some() {
        debug!("{} is a conversation, using its current stance", path.display());
        let conversation: Conversation = serde_json::from_value(value)?;
        Ok((conversation.stance, Some(conversation.updated_at)))
    } else {
        Ok((serde_json::from_value(value)?, None))
    }
}

fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
