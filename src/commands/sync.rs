use anyhow::{Context, Result};
use shiftsync_core::pipeline;
use tracing::info;

use super::google_clients;
use crate::config::Settings;

/// Prints the run summary as JSON on stdout; logs go to stderr.
pub async fn run(settings: &Settings) -> Result<()> {
    let sync_settings = settings.sync_settings()?;
    let (source, calendar) = google_clients(settings, &sync_settings)?;

    let report = pipeline::run(&source, &calendar, &settings.message_query(), &sync_settings)
        .await
        .context("Sync failed")?;

    info!(
        message_id = %report.message_id,
        rows_skipped = report.rows_skipped,
        "{}",
        report.result
    );

    println!("{}", serde_json::to_string(&report.result)?);
    Ok(())
}
