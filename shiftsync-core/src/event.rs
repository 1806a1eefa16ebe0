//! Calendar events as the sync engine sees them.
//!
//! Providers convert their API payloads into these types; the engine never
//! looks at provider-specific fields.

use serde::{Deserialize, Serialize};

use crate::fingerprint::ShiftTag;
use crate::window::TimeWindow;

/// An event that already exists on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub window: TimeWindow,
    /// Present only on events created by shiftsync.
    pub tag: Option<ShiftTag>,
}

/// Who owns an existing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership<'a> {
    Managed(&'a ShiftTag),
    Foreign,
}

impl CalendarEvent {
    pub fn ownership(&self) -> Ownership<'_> {
        match &self.tag {
            Some(tag) => Ownership::Managed(tag),
            None => Ownership::Foreign,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.tag.is_some()
    }
}

/// A managed event to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub summary: String,
    pub description: Option<String>,
    pub window: TimeWindow,
    /// IANA zone name the event is displayed in.
    pub time_zone: String,
    pub color_id: Option<String>,
    pub tag: ShiftTag,
}
