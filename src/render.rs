//! Colored terminal rendering for shiftsync-core types.

use owo_colors::OwoColorize;
use shiftsync_core::sync::ChangeKind;
use shiftsync_core::{PlannedChange, RowParseSkipped, ShiftRecord, SyncResult};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for ShiftRecord {
    fn render(&self) -> String {
        format!("{} {}", self, format!("({})", self.raw_label).dimmed())
    }
}

impl Render for PlannedChange {
    fn render(&self) -> String {
        let line = self.to_string();
        let mut rendered = match &self.kind {
            ChangeKind::Create(_) => line.green().to_string(),
            ChangeKind::Update { .. } => line.yellow().to_string(),
            ChangeKind::Unchanged { .. } => line.dimmed().to_string(),
            ChangeKind::Blocked { .. } | ChangeKind::Unschedulable { .. } => {
                line.red().to_string()
            }
        };

        if !self.foreign_overlaps.is_empty() {
            let note = format!("also overlaps {}", self.foreign_overlaps.join(", "));
            rendered.push_str(&format!(" {}", note.dimmed()));
        }
        rendered
    }
}

impl Render for RowParseSkipped {
    fn render(&self) -> String {
        format!(
            "{} row {}: {} {}",
            "?".red(),
            self.row,
            self.reason,
            format!("[{}]", self.raw_label).dimmed()
        )
    }
}

impl Render for SyncResult {
    fn render(&self) -> String {
        format!(
            "{} to create, {} to update, {} to skip",
            self.created.green(),
            self.updated.yellow(),
            self.skipped.dimmed()
        )
    }
}
