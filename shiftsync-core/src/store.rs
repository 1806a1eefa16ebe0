//! Collaborator seams: where the schedule email comes from and where events go.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::event::{CalendarEvent, NewEvent};
use crate::fingerprint::ShiftTag;
use crate::window::TimeWindow;

/// Which message to look for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageQuery {
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub lookback_days: u32,
}

/// The most recent matching message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    pub id: String,
    pub html: String,
    pub received_at: DateTime<Utc>,
}

impl fmt::Display for MessageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "messages")?;
        if let Some(sender) = &self.sender {
            write!(f, " from '{sender}'")?;
        }
        if let Some(subject) = &self.subject {
            write!(f, " with subject '{subject}'")?;
        }
        write!(f, " in the last {} days", self.lookback_days)
    }
}

#[allow(async_fn_in_trait)]
pub trait MessageSource {
    /// `Ok(None)` when nothing matches within the lookback window.
    async fn latest_message(&self, query: &MessageQuery)
    -> Result<Option<FetchedMessage>, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait CalendarStore {
    /// Events whose window intersects `window`, managed and foreign alike.
    async fn list_events(&self, window: &TimeWindow) -> Result<Vec<CalendarEvent>, StoreError>;

    async fn insert_event(&self, event: &NewEvent) -> Result<CalendarEvent, StoreError>;

    /// Moves an existing managed event and rewrites its tag.
    async fn update_event(
        &self,
        id: &str,
        window: &TimeWindow,
        tag: &ShiftTag,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_description_names_filters() {
        let query = MessageQuery {
            sender: Some("schedules@example.com".into()),
            subject: None,
            lookback_days: 7,
        };
        assert_eq!(
            query.to_string(),
            "messages from 'schedules@example.com' in the last 7 days"
        );
    }
}
