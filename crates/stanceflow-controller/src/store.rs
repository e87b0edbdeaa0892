//! File-backed conversation persistence.
//!
//! One `<id>.json` per conversation, written via temp file + rename so a
//! crash mid-write leaves the previous durable copy intact.

use stanceflow_core::{Conversation, ConversationId, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct ConversationStore {
    root: PathBuf,
}

impl ConversationStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ids become file names, so anything that could leave the store
    /// directory is rejected.
    fn path_for(&self, id: &ConversationId) -> Result<PathBuf> {
        let raw = id.as_str();
        if raw.is_empty()
            || raw.starts_with('.')
            || raw.contains("..")
            || raw.contains(['/', '\\', '\0'])
        {
            return Err(Error::validation(format!(
                "conversation id '{}' cannot be used as a file name",
                raw
            )));
        }
        Ok(self.root.join(format!("{}.json", raw)))
    }

    pub fn save(&self, conversation: &Conversation) -> Result<PathBuf> {
        let path = self.path_for(&conversation.id)?;
        let json = serde_json::to_string_pretty(conversation)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        debug!("Saved conversation {} to {}", conversation.id, path.display());
        Ok(path)
    }

    pub fn load(&self, id: &ConversationId) -> Result<Conversation> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(Error::conversation_not_found(id.as_str()));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Ids of every stored conversation, sorted.
    pub fn list_ids(&self) -> Result<Vec<ConversationId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match path.file_stem().and_then(|s| s.to_str()) {
                    Some(stem) => ids.push(ConversationId::new(stem)),
                    None => warn!("Skipping unreadable store entry {}", path.display()),
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Returns whether a file was removed.
    pub fn remove(&self, id: &ConversationId) -> Result<bool> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        Ok(true)
    }
}
