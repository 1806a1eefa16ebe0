//! One full run: fetch the latest schedule email, parse it, sync it.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::parse::{self, ParsedSchedule};
use crate::settings::SyncSettings;
use crate::store::{CalendarStore, FetchedMessage, MessageQuery, MessageSource};
use crate::sync::{PlannedChange, SyncEngine, SyncResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub message_id: String,
    #[serde(flatten)]
    pub result: SyncResult,
    pub rows_skipped: usize,
}

/// Fetches and parses the most recent schedule message.
///
/// Yearless dates in the table are placed nearest the day the message was
/// received, as seen from the configured timezone.
pub async fn fetch_schedule<M: MessageSource>(
    source: &M,
    query: &MessageQuery,
    settings: &SyncSettings,
) -> ShiftSyncResult<(FetchedMessage, ParsedSchedule)> {
    let message = source
        .latest_message(query)
        .await
        .map_err(|e| ShiftSyncError::MessageSourceFailed(e.to_string()))?
        .ok_or_else(|| ShiftSyncError::MessageNotFound {
            query: query.to_string(),
        })?;

    info!(message_id = %message.id, received_at = %message.received_at, "Found schedule message");

    let received = message.received_at.with_timezone(&settings.timezone).date_naive();
    let schedule = parse::parse(&message.html, received)?;

    for skipped in &schedule.skipped {
        warn!(row = skipped.row, label = %skipped.raw_label, reason = %skipped.reason, "Skipping row");
    }
    info!(
        shifts = schedule.records.len(),
        skipped_rows = schedule.skipped.len(),
        "Parsed schedule"
    );

    Ok((message, schedule))
}

pub async fn run<M: MessageSource, S: CalendarStore>(
    source: &M,
    store: &S,
    query: &MessageQuery,
    settings: &SyncSettings,
) -> ShiftSyncResult<RunReport> {
    let (message, schedule) = fetch_schedule(source, query, settings).await?;
    let result = SyncEngine::new(store, settings).sync(&schedule.records).await?;

    Ok(RunReport {
        message_id: message.id,
        result,
        rows_skipped: schedule.skipped.len(),
    })
}

/// Like [`run`] but only reports what would change.
pub async fn plan<M: MessageSource, S: CalendarStore>(
    source: &M,
    store: &S,
    query: &MessageQuery,
    settings: &SyncSettings,
) -> ShiftSyncResult<(ParsedSchedule, Vec<PlannedChange>)> {
    let (_, schedule) = fetch_schedule(source, query, settings).await?;
    let changes = SyncEngine::new(store, settings).plan(&schedule.records).await?;
    Ok((schedule, changes))
}
