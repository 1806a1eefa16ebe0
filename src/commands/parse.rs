use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;

use crate::render::Render;

pub fn run(file: &Path, received: Option<NaiveDate>, json: bool) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let received = received.unwrap_or_else(|| Local::now().date_naive());

    let schedule = shiftsync_core::parse::parse(&html, received)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
        return Ok(());
    }

    println!("{}", format!("{} shifts", schedule.records.len()).bold());
    for record in &schedule.records {
        println!("   {}", record.render());
    }

    if !schedule.skipped.is_empty() {
        println!();
        println!("{}", format!("{} rows skipped", schedule.skipped.len()).bold());
        for skipped in &schedule.skipped {
            println!("   {}", skipped.render());
        }
    }

    Ok(())
}
