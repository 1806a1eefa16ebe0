//! Google collaborators for shiftsync: Gmail as the schedule source and
//! Google Calendar as the event store, over plain REST.

pub mod auth;
pub mod calendar;
pub mod gmail;
pub mod types;

pub use auth::{GoogleAuth, authorize};
pub use calendar::GoogleCalendar;
pub use gmail::GmailSource;
pub use types::GoogleCredentials;

use anyhow::{Result, bail};

/// Turns a non-2xx response into an error that includes the body Google sent.
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!("Google API returned {}: {}", status, body.trim())
}
