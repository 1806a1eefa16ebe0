//! Reconciling parsed shifts with a calendar.

mod engine;
mod outcome;

pub use engine::{ChangeKind, PlannedChange, SyncEngine, decide};
pub use outcome::{SkipCause, SyncOutcome, SyncResult};
