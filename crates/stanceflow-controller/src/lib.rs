//! stanceflow controller - applies stance deltas under a drift budget

pub mod controller;
pub mod drift;
pub mod store;

pub use controller::{evolve, ConversationSummary, StanceController, StanceTransition};
pub use drift::{calculate_drift_magnitude, scale_delta, ScaledDelta};
pub use store::ConversationStore;
