//! stanceflow core - stance data model, bounds, validation, and errors

pub mod error;
pub mod stance;
pub mod types;

pub use error::{EntityKind, Error, Result};
pub use stance::*;
pub use types::*;
