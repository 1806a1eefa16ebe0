//! Core of shiftsync: turns a work-schedule email into calendar events.
//!
//! - [`parse`] extracts [`ShiftRecord`]s from the email's HTML table
//! - [`fingerprint`] gives each shift a stable identity
//! - [`overlap`] classifies a shift against the events already on its day
//! - [`sync`] decides create / update / skip and folds a [`SyncResult`]
//!
//! Mail and calendar access sit behind the traits in [`store`].

pub mod error;
pub mod event;
pub mod fingerprint;
pub mod memory;
pub mod overlap;
pub mod parse;
pub mod pipeline;
pub mod settings;
pub mod shift;
pub mod store;
pub mod sync;
pub mod window;

pub use error::{ShiftSyncError, ShiftSyncResult, StoreError};
pub use event::{CalendarEvent, NewEvent, Ownership};
pub use fingerprint::{Fingerprint, ShiftKey, ShiftTag};
pub use memory::MemoryCalendar;
pub use parse::{ParsedSchedule, RowParseSkipped, SkipReason};
pub use settings::SyncSettings;
pub use shift::ShiftRecord;
pub use store::{CalendarStore, FetchedMessage, MessageQuery, MessageSource};
pub use sync::{PlannedChange, SkipCause, SyncEngine, SyncOutcome, SyncResult};
pub use window::TimeWindow;
