//! stanceflow diff - structural stance diff and three-way merge

pub mod diff;
pub mod merge;
pub mod path;

pub use diff::{diff, ChangeKind, DiffChange, DiffSummary, Significance, StanceDiff};
pub use merge::{differing_paths, merge, MergeConflict, MergeResult, MergeStrategy};
pub use path::{FieldValue, StancePath};
