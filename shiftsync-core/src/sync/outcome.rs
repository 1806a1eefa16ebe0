//! Per-record outcomes and the run summary folded from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal state of one shift record within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Created,
    Updated,
    Skipped(SkipCause),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCause {
    /// A user-authored event occupies the slot.
    ForeignConflict,
    /// The managed event already matches.
    Unchanged,
    /// The shift starts or ends inside a DST gap.
    NonexistentLocalTime,
}

/// Counts of what a run did. Every record lands in exactly one counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl SyncResult {
    pub fn new(created: usize, updated: usize, skipped: usize) -> Self {
        SyncResult {
            created,
            updated,
            skipped,
        }
    }

    /// Returns the summary with one more outcome counted.
    pub fn with(self, outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Created => SyncResult {
                created: self.created + 1,
                ..self
            },
            SyncOutcome::Updated => SyncResult {
                updated: self.updated + 1,
                ..self
            },
            SyncOutcome::Skipped(_) => SyncResult {
                skipped: self.skipped + 1,
                ..self
            },
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped
    }
}

impl FromIterator<SyncOutcome> for SyncResult {
    fn from_iter<I: IntoIterator<Item = SyncOutcome>>(iter: I) -> Self {
        iter.into_iter().fold(SyncResult::default(), SyncResult::with)
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped",
            self.created, self.updated, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_outcomes_into_counters() {
        let result: SyncResult = [
            SyncOutcome::Created,
            SyncOutcome::Skipped(SkipCause::Unchanged),
            SyncOutcome::Updated,
            SyncOutcome::Skipped(SkipCause::ForeignConflict),
        ]
        .into_iter()
        .collect();

        assert_eq!(result, SyncResult::new(1, 1, 2));
        assert_eq!(result.total(), 4);
    }

    #[test]
    fn serializes_as_plain_counts() {
        let json = serde_json::to_string(&SyncResult::new(2, 0, 1)).unwrap();
        assert_eq!(json, r#"{"created":2,"updated":0,"skipped":1}"#);
    }
}
