//! In-process calendar used for dry runs and tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::event::{CalendarEvent, NewEvent};
use crate::fingerprint::ShiftTag;
use crate::store::CalendarStore;
use crate::window::TimeWindow;

/// A write the calendar accepted, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Insert { id: String },
    Update { id: String },
}

#[derive(Debug, Default)]
pub struct MemoryCalendar {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    events: Vec<CalendarEvent>,
    writes: Vec<Write>,
    next_id: u64,
    /// Reject every write once this many have been accepted.
    write_budget: Option<usize>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        let calendar = Self::new();
        {
            let mut state = calendar.lock();
            state.next_id = events.len() as u64;
            state.events = events;
        }
        calendar
    }

    /// Makes every write after the first `accepted` fail.
    pub fn fail_writes_after(self, accepted: usize) -> Self {
        self.lock().write_budget = Some(accepted);
        self
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.lock().events.clone()
    }

    pub fn writes(&self) -> Vec<Write> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn check_budget(&self) -> Result<(), StoreError> {
        match self.write_budget {
            Some(budget) if self.writes.len() >= budget => {
                Err(StoreError::new("calendar is read-only"))
            }
            _ => Ok(()),
        }
    }
}

impl CalendarStore for MemoryCalendar {
    async fn list_events(&self, window: &TimeWindow) -> Result<Vec<CalendarEvent>, StoreError> {
        Ok(self
            .lock()
            .events
            .iter()
            .filter(|event| event.window.overlaps(window))
            .cloned()
            .collect())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<CalendarEvent, StoreError> {
        let mut state = self.lock();
        state.check_budget()?;

        state.next_id += 1;
        let created = CalendarEvent {
            id: format!("mem-{}", state.next_id),
            summary: event.summary.clone(),
            window: event.window,
            tag: Some(event.tag.clone()),
        };

        state.events.push(created.clone());
        state.writes.push(Write::Insert {
            id: created.id.clone(),
        });
        Ok(created)
    }

    async fn update_event(
        &self,
        id: &str,
        window: &TimeWindow,
        tag: &ShiftTag,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check_budget()?;

        let event = state
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or_else(|| StoreError::new(format!("event {id} not found")))?;
        event.window = *window;
        event.tag = Some(tag.clone());

        state.writes.push(Write::Update { id: id.to_string() });
        Ok(())
    }
}
