//! stanceflow - persona stance controller with drift budgets, decay,
//! diffing, and checkpoint history

pub mod commands;
pub mod config;

pub use commands::{ApplyOutcome, ConversationSource, DecayOutput, Workspace};
pub use config::StanceflowConfig;
