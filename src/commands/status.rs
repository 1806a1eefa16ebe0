use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use shiftsync_core::{SyncResult, pipeline};

use super::google_clients;
use crate::config::Settings;
use crate::render::Render;
use crate::utils::tui::LookupSpinner;

pub async fn run(settings: &Settings) -> Result<()> {
    let sync_settings = settings.sync_settings()?;
    let (source, calendar) = google_clients(settings, &sync_settings)?;
    let query = settings.message_query();

    let result = LookupSpinner::start(&query, &settings.calendar_id)
        .around(pipeline::plan(&source, &calendar, &query, &sync_settings))
        .await;

    let (schedule, changes) = result.context("Could not compute status")?;

    for skipped in &schedule.skipped {
        println!("   {}", skipped.render());
    }

    if changes.is_empty() {
        println!("{}", "No shifts in the latest schedule".dimmed());
        return Ok(());
    }

    println!("{}", format!("📅 {}", settings.calendar_id).bold());
    for change in &changes {
        println!("   {}", change.render());
    }

    let totals: SyncResult = changes.iter().map(|change| change.kind.outcome()).collect();

    println!();
    println!("{}", totals.render());

    Ok(())
}
