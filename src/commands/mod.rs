pub mod auth;
pub mod config;
pub mod parse;
pub mod status;
pub mod sync;

use std::sync::Arc;

use anyhow::Result;
use shiftsync_core::SyncSettings;
use shiftsync_provider_google::{GmailSource, GoogleAuth, GoogleCalendar};

use crate::config::Settings;

/// Gmail and Calendar clients sharing one token cache.
pub fn google_clients(
    settings: &Settings,
    sync_settings: &SyncSettings,
) -> Result<(GmailSource, GoogleCalendar)> {
    let auth = Arc::new(GoogleAuth::new(settings.credentials()?));
    let source = GmailSource::new(Arc::clone(&auth));
    let calendar = GoogleCalendar::new(auth, &settings.calendar_id, sync_settings.timezone);
    Ok((source, calendar))
}
