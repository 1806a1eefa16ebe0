//! Classifies a candidate shift against the events already on its day.

use crate::event::{CalendarEvent, Ownership};
use crate::fingerprint::ShiftTag;
use crate::window::TimeWindow;

/// The shift about to be synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub window: TimeWindow,
    pub tag: ShiftTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    NoConflict,
    /// A shiftsync event for the same shift (same fingerprint) or the same
    /// slot (same shift key, content changed).
    ManagedMatch(&'a CalendarEvent),
    /// A user-authored event intersects the candidate, whatever its free/busy status.
    ForeignConflict(&'a CalendarEvent),
}

/// Classification plus the foreign overlaps a managed match took precedence over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub classification: Classification<'a>,
    pub foreign_overlaps: Vec<&'a CalendarEvent>,
}

pub fn classify<'a>(candidate: &Candidate, existing: &'a [CalendarEvent]) -> Resolution<'a> {
    let foreign_overlaps: Vec<&CalendarEvent> = existing
        .iter()
        .filter(|event| {
            event.ownership() == Ownership::Foreign && event.window.overlaps(&candidate.window)
        })
        .collect();

    let managed_match = find_managed(existing, |tag| tag.fingerprint == candidate.tag.fingerprint)
        .or_else(|| find_managed(existing, |tag| tag.shift_key == candidate.tag.shift_key));

    match (managed_match, foreign_overlaps.first()) {
        (Some(event), _) => Resolution {
            classification: Classification::ManagedMatch(event),
            foreign_overlaps,
        },
        (None, Some(&event)) => Resolution {
            classification: Classification::ForeignConflict(event),
            foreign_overlaps,
        },
        (None, None) => Resolution {
            classification: Classification::NoConflict,
            foreign_overlaps,
        },
    }
}

fn find_managed(
    existing: &[CalendarEvent],
    matches: impl Fn(&ShiftTag) -> bool,
) -> Option<&CalendarEvent> {
    existing.iter().find(|event| match event.ownership() {
        Ownership::Managed(tag) => matches(tag),
        Ownership::Foreign => false,
    })
}
