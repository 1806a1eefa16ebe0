//! The create / update / skip policy and its application.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::event::{CalendarEvent, NewEvent};
use crate::fingerprint::ShiftTag;
use crate::overlap::{Candidate, Classification, classify};
use crate::settings::SyncSettings;
use crate::shift::ShiftRecord;
use crate::store::CalendarStore;
use crate::sync::{SkipCause, SyncOutcome, SyncResult};
use crate::window::TimeWindow;

/// What the engine intends to do for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub record: ShiftRecord,
    pub kind: ChangeKind,
    /// Summaries of user events overlapping a managed match.
    pub foreign_overlaps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Create(NewEvent),
    Update {
        event_id: String,
        from: TimeWindow,
        to: TimeWindow,
        tag: ShiftTag,
    },
    Unchanged {
        event_id: String,
    },
    /// A user-authored event occupies the slot.
    Blocked {
        event_id: String,
        summary: String,
    },
    /// The shift's local times do not exist in the configured zone.
    Unschedulable {
        reason: String,
    },
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ChangeKind::Create(_) => write!(f, "+ {}", self.record),
            ChangeKind::Update { .. } => write!(f, "~ {}", self.record),
            ChangeKind::Unchanged { .. } => write!(f, "= {}", self.record),
            ChangeKind::Blocked { summary, .. } => {
                write!(f, "! {} (overlaps \"{}\")", self.record, summary)
            }
            ChangeKind::Unschedulable { reason } => write!(f, "? {} ({})", self.record, reason),
        }
    }
}

/// Reconciles shift records against a calendar.
///
/// Records are handled one at a time, in order: each one lists its day,
/// decides, and writes before the next is looked at.
pub struct SyncEngine<'a, S> {
    store: &'a S,
    settings: &'a SyncSettings,
}

impl<'a, S: CalendarStore> SyncEngine<'a, S> {
    pub fn new(store: &'a S, settings: &'a SyncSettings) -> Self {
        SyncEngine { store, settings }
    }

    /// Applies the policy to every record.
    ///
    /// The first failed calendar call aborts the run; writes already made stay,
    /// and a retry matches them by fingerprint.
    pub async fn sync(&self, records: &[ShiftRecord]) -> ShiftSyncResult<SyncResult> {
        let mut outcomes = Vec::with_capacity(records.len());

        for (record, ordinal) in with_ordinals(records) {
            let change = self.plan_record(record, ordinal).await?;
            outcomes.push(self.apply(&change).await?);
        }

        let result: SyncResult = outcomes.into_iter().collect();
        info!(
            created = result.created,
            updated = result.updated,
            skipped = result.skipped,
            "Sync finished"
        );
        Ok(result)
    }

    /// Decides for every record without writing anything.
    pub async fn plan(&self, records: &[ShiftRecord]) -> ShiftSyncResult<Vec<PlannedChange>> {
        let mut changes = Vec::with_capacity(records.len());
        for (record, ordinal) in with_ordinals(records) {
            changes.push(self.plan_record(record, ordinal).await?);
        }
        Ok(changes)
    }

    async fn plan_record(
        &self,
        record: &ShiftRecord,
        ordinal: usize,
    ) -> ShiftSyncResult<PlannedChange> {
        let tz = self.settings.timezone;
        let tag = ShiftTag::for_record(record, &self.settings.event_title, ordinal);

        let window = match record.window(tz) {
            Ok(window) => window,
            Err(gap) => {
                return Ok(PlannedChange {
                    record: record.clone(),
                    kind: ChangeKind::Unschedulable {
                        reason: gap.to_string(),
                    },
                    foreign_overlaps: Vec::new(),
                });
            }
        };

        let day = TimeWindow::local_day(record.date, tz);
        let existing = self
            .store
            .list_events(&day)
            .await
            .map_err(|e| ShiftSyncError::CalendarReadFailed(e.to_string()))?;

        Ok(decide(record, Candidate { window, tag }, &existing, self.settings))
    }

    async fn apply(&self, change: &PlannedChange) -> ShiftSyncResult<SyncOutcome> {
        let record = &change.record;

        match &change.kind {
            ChangeKind::Create(new_event) => {
                let created = self.store.insert_event(new_event).await.map_err(|e| {
                    ShiftSyncError::CalendarWriteFailed {
                        action: "insert",
                        detail: e.to_string(),
                    }
                })?;
                info!(shift = %record, event_id = %created.id, "Created event");
            }
            ChangeKind::Update {
                event_id, to, tag, ..
            } => {
                self.store
                    .update_event(event_id, to, tag)
                    .await
                    .map_err(|e| ShiftSyncError::CalendarWriteFailed {
                        action: "update",
                        detail: e.to_string(),
                    })?;
                info!(shift = %record, event_id = %event_id, "Updated event");
            }
            ChangeKind::Unchanged { event_id } => {
                debug!(shift = %record, event_id = %event_id, "Already in sync");
            }
            ChangeKind::Blocked { summary, .. } => {
                warn!(shift = %record, existing = %summary, "Skipping shift: overlaps an event you created");
            }
            ChangeKind::Unschedulable { reason } => {
                warn!(shift = %record, %reason, "Skipping shift");
            }
        }

        Ok(change.kind.outcome())
    }
}

impl ChangeKind {
    /// The outcome this change has once applied.
    pub fn outcome(&self) -> SyncOutcome {
        match self {
            ChangeKind::Create(_) => SyncOutcome::Created,
            ChangeKind::Update { .. } => SyncOutcome::Updated,
            ChangeKind::Unchanged { .. } => SyncOutcome::Skipped(SkipCause::Unchanged),
            ChangeKind::Blocked { .. } => SyncOutcome::Skipped(SkipCause::ForeignConflict),
            ChangeKind::Unschedulable { .. } => {
                SyncOutcome::Skipped(SkipCause::NonexistentLocalTime)
            }
        }
    }
}

/// The policy itself: pure over the candidate and the events of its day.
pub fn decide(
    record: &ShiftRecord,
    candidate: Candidate,
    existing: &[CalendarEvent],
    settings: &SyncSettings,
) -> PlannedChange {
    let resolution = classify(&candidate, existing);
    let foreign_overlaps: Vec<String> = resolution
        .foreign_overlaps
        .iter()
        .map(|event| event.summary.clone())
        .collect();

    let kind = match resolution.classification {
        Classification::NoConflict => ChangeKind::Create(NewEvent {
            summary: settings.event_title.clone(),
            description: Some(record.raw_label.clone()).filter(|d| !d.is_empty()),
            window: candidate.window,
            time_zone: settings.timezone.name().to_string(),
            color_id: settings.color_id.clone(),
            tag: candidate.tag,
        }),
        Classification::ForeignConflict(event) => ChangeKind::Blocked {
            event_id: event.id.clone(),
            summary: event.summary.clone(),
        },
        Classification::ManagedMatch(event) => {
            for summary in &foreign_overlaps {
                warn!(shift = %record, existing = %summary, "Managed shift overlaps an event you created");
            }

            if event.window == candidate.window && event.tag.as_ref() == Some(&candidate.tag) {
                ChangeKind::Unchanged {
                    event_id: event.id.clone(),
                }
            } else {
                ChangeKind::Update {
                    event_id: event.id.clone(),
                    from: event.window,
                    to: candidate.window,
                    tag: candidate.tag,
                }
            }
        }
    };

    PlannedChange {
        record: record.clone(),
        kind,
        foreign_overlaps,
    }
}

/// Pairs each record with its position among the records of the same date.
fn with_ordinals(records: &[ShiftRecord]) -> Vec<(&ShiftRecord, usize)> {
    let mut per_date: HashMap<NaiveDate, usize> = HashMap::new();
    records
        .iter()
        .map(|record| {
            let count = per_date.entry(record.date).or_default();
            let ordinal = *count;
            *count += 1;
            (record, ordinal)
        })
        .collect()
}
