//! Error types for shiftsync.

use thiserror::Error;

/// Errors that abort a shiftsync run.
///
/// Per-row parse problems are not errors; see [`crate::parse::RowParseSkipped`].
#[derive(Error, Debug)]
pub enum ShiftSyncError {
    #[error("No schedule table found in message")]
    NoScheduleTableFound,

    #[error("No message matching {query} found")]
    MessageNotFound { query: String },

    #[error("Failed to fetch message: {0}")]
    MessageSourceFailed(String),

    #[error("Failed to list calendar events: {0}")]
    CalendarReadFailed(String),

    #[error("Calendar rejected {action}: {detail}")]
    CalendarWriteFailed { action: &'static str, detail: String },

    #[error("Unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for shiftsync operations.
pub type ShiftSyncResult<T> = Result<T, ShiftSyncError>;

/// Failure reported by a collaborator (message source or calendar store).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        StoreError(msg.into())
    }
}
