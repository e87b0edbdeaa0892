//! Error types for stanceflow

use std::fmt;
use thiserror::Error;

/// What kind of entity a lookup failed to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Conversation,
    Checkpoint,
    Branch,
    Profile,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Conversation => "conversation",
            EntityKind::Checkpoint => "checkpoint",
            EntityKind::Branch => "branch",
            EntityKind::Profile => "profile",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("branch already exists: {0}")]
    BranchExists(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn conversation_not_found(id: impl Into<String>) -> Self {
        Self::not_found(EntityKind::Conversation, id)
    }

    pub fn checkpoint_not_found(id: impl Into<String>) -> Self {
        Self::not_found(EntityKind::Checkpoint, id)
    }

    pub fn branch_not_found(id: impl Into<String>) -> Self {
        Self::not_found(EntityKind::Branch, id)
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation(reason.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
