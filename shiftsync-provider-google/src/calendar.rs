//! Google Calendar v3 as a [`CalendarStore`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use shiftsync_core::fingerprint::{Fingerprint, ShiftKey};
use shiftsync_core::{CalendarEvent, CalendarStore, NewEvent, ShiftTag, StoreError, TimeWindow};
use tracing::debug;

use crate::auth::GoogleAuth;
use crate::ensure_success;
use crate::types::{EventDateTime, EventList, ExtendedProperties, GoogleEvent};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Private extended property keys carrying the [`ShiftTag`].
pub const FINGERPRINT_PROPERTY: &str = "shiftsync_fingerprint";
pub const SHIFT_KEY_PROPERTY: &str = "shiftsync_shift_key";

pub struct GoogleCalendar {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    base_url: String,
    calendar_id: String,
    /// Used to place all-day events.
    timezone: Tz,
}

impl GoogleCalendar {
    pub fn new(auth: Arc<GoogleAuth>, calendar_id: impl Into<String>, timezone: Tz) -> Self {
        GoogleCalendar {
            http: reqwest::Client::new(),
            auth,
            base_url: DEFAULT_BASE_URL.to_string(),
            calendar_id: calendar_id.into(),
            timezone,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn events_url(&self) -> String {
        let calendar_id: String =
            url::form_urlencoded::byte_serialize(self.calendar_id.as_bytes()).collect();
        format!("{}/calendars/{}/events", self.base_url, calendar_id)
    }

    async fn list(&self, window: &TimeWindow) -> Result<Vec<CalendarEvent>> {
        let token = self.auth.access_token().await?;
        let url = self.events_url();

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(&url).bearer_auth(&token).query(&[
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("maxResults", "250".to_string()),
            ]);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page)]);
            }

            let response = request.send().await.context("Failed to list events")?;
            let page: EventList = ensure_success(response)
                .await
                .context("Failed to list events")?
                .json()
                .await
                .context("Invalid event list")?;

            events.extend(page.items.into_iter().filter_map(|e| self.to_calendar_event(e)));

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(calendar = %self.calendar_id, %window, count = events.len(), "Listed events");
        Ok(events)
    }

    async fn insert(&self, event: &NewEvent) -> Result<CalendarEvent> {
        let token = self.auth.access_token().await?;
        let body = GoogleEvent {
            summary: Some(event.summary.clone()),
            description: event.description.clone(),
            start: Some(timed(event.window.start, &event.time_zone)),
            end: Some(timed(event.window.end, &event.time_zone)),
            color_id: event.color_id.clone(),
            extended_properties: Some(tag_properties(&event.tag)),
            ..Default::default()
        };

        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to create event: {}", event.summary))?;

        let created: GoogleEvent = ensure_success(response)
            .await
            .with_context(|| format!("Failed to create event: {}", event.summary))?
            .json()
            .await
            .context("Invalid event in response")?;

        self.to_calendar_event(created)
            .context("Created event came back without an id or times")
    }

    async fn patch(&self, id: &str, window: &TimeWindow, tag: &ShiftTag) -> Result<()> {
        let token = self.auth.access_token().await?;
        let time_zone = self.timezone.name();
        let body = GoogleEvent {
            start: Some(timed(window.start, time_zone)),
            end: Some(timed(window.end, time_zone)),
            extended_properties: Some(tag_properties(tag)),
            ..Default::default()
        };

        let event_id: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
        let response = self
            .http
            .patch(format!("{}/{}", self.events_url(), event_id))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to update event: {}", id))?;

        ensure_success(response)
            .await
            .with_context(|| format!("Failed to update event: {}", id))?;
        Ok(())
    }

    fn to_calendar_event(&self, event: GoogleEvent) -> Option<CalendarEvent> {
        if event.status.as_deref() == Some("cancelled") {
            return None;
        }
        let id = event.id?;
        let start = self.instant(event.start.as_ref()?)?;
        let end = self.instant(event.end.as_ref()?)?;

        let tag = event
            .extended_properties
            .as_ref()
            .and_then(|props| read_tag(&props.private));

        Some(CalendarEvent {
            id,
            summary: event.summary.unwrap_or_else(|| "(No title)".to_string()),
            window: TimeWindow::new(start, end),
            tag,
        })
    }

    /// All-day boundaries are midnight in the configured zone.
    fn instant(&self, time: &EventDateTime) -> Option<chrono::DateTime<chrono::Utc>> {
        match (time.date_time, time.date) {
            (Some(date_time), _) => Some(date_time),
            (None, Some(date)) => Some(TimeWindow::local_day(date, self.timezone).start),
            (None, None) => None,
        }
    }
}

fn timed(at: chrono::DateTime<chrono::Utc>, time_zone: &str) -> EventDateTime {
    EventDateTime {
        date_time: Some(at),
        date: None,
        time_zone: Some(time_zone.to_string()),
    }
}

fn tag_properties(tag: &ShiftTag) -> ExtendedProperties {
    let private = HashMap::from([
        (FINGERPRINT_PROPERTY.to_string(), tag.fingerprint.as_str().to_string()),
        (SHIFT_KEY_PROPERTY.to_string(), tag.shift_key.as_str().to_string()),
    ]);
    ExtendedProperties { private }
}

/// An event carrying our fingerprint is ours even if the shift key is missing.
fn read_tag(private: &HashMap<String, String>) -> Option<ShiftTag> {
    let fingerprint = private.get(FINGERPRINT_PROPERTY)?;
    let shift_key = private.get(SHIFT_KEY_PROPERTY).cloned().unwrap_or_default();
    Some(ShiftTag {
        fingerprint: Fingerprint::from_stored(fingerprint.clone()),
        shift_key: ShiftKey::from_stored(shift_key),
    })
}

fn store_error(err: anyhow::Error) -> StoreError {
    StoreError::new(format!("{err:#}"))
}

impl CalendarStore for GoogleCalendar {
    async fn list_events(&self, window: &TimeWindow) -> Result<Vec<CalendarEvent>, StoreError> {
        self.list(window).await.map_err(store_error)
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<CalendarEvent, StoreError> {
        self.insert(event).await.map_err(store_error)
    }

    async fn update_event(
        &self,
        id: &str,
        window: &TimeWindow,
        tag: &ShiftTag,
    ) -> Result<(), StoreError> {
        self.patch(id, window, tag).await.map_err(store_error)
    }
}
