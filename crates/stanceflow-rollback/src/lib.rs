//! stanceflow rollback - checkpoint DAG with named branches per conversation

pub mod checkpoint;
pub mod history;

pub use checkpoint::{Branch, Checkpoint, CheckpointId, RollbackConfig, DEFAULT_BRANCH};
pub use history::{BranchMerge, StanceHistory};
