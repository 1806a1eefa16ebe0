//! Extraction of shift records from the schedule email's HTML table.
//!
//! Parsing is best-effort per row: a row that cannot be understood becomes a
//! [`RowParseSkipped`] diagnostic and the rest of the table is still used.
//! Only a document without any usable table is an error.

mod date;
mod shift_cell;
mod text;

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::shift::ShiftRecord;

use date::parse_date_cell;
use shift_cell::{ShiftCell, parse_shift_cell};

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("static selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("static selector"));

/// Why a row produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "text", rename_all = "snake_case")]
pub enum SkipReason {
    MissingDate,
    /// Looks like a date but does not exist, e.g. "30/02".
    InvalidDate(String),
    UnrecognizedShift(String),
    InvalidTime(String),
    InvertedTimeRange(String),
}

/// Non-fatal diagnostic for one rejected row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowParseSkipped {
    /// Zero-based position of the row in the table.
    pub row: usize,
    pub raw_label: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Everything extracted from one schedule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedSchedule {
    /// In document order.
    pub records: Vec<ShiftRecord>,
    pub skipped: Vec<RowParseSkipped>,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingDate => write!(f, "no date cell"),
            SkipReason::InvalidDate(text) => write!(f, "date '{text}' does not exist"),
            SkipReason::UnrecognizedShift(text) if text.is_empty() => write!(f, "no shift cell"),
            SkipReason::UnrecognizedShift(text) => write!(f, "unrecognized shift '{text}'"),
            SkipReason::InvalidTime(text) => write!(f, "invalid time in '{text}'"),
            SkipReason::InvertedTimeRange(text) => write!(f, "shift '{text}' ends before it starts"),
        }
    }
}

/// Parses the schedule table out of an email body.
///
/// Dates written without a year are placed nearest `received`, the day the
/// schedule was sent.
pub fn parse(html: &str, received: NaiveDate) -> ShiftSyncResult<ParsedSchedule> {
    let document = Html::parse_document(html);
    let table = find_schedule_table(&document).ok_or(ShiftSyncError::NoScheduleTableFound)?;

    let mut schedule = ParsedSchedule::default();
    let mut previous: Option<NaiveDate> = None;

    for (index, row) in table.select(&ROW).enumerate() {
        match parse_row(row, index, received, previous) {
            RowOutcome::Ignored => {}
            RowOutcome::DayOff(date) => previous = Some(date),
            RowOutcome::Shift(record) => {
                previous = Some(record.date);
                schedule.records.push(record);
            }
            RowOutcome::Skipped(skipped) => schedule.skipped.push(skipped),
        }
    }

    Ok(schedule)
}

enum RowOutcome {
    Ignored,
    DayOff(NaiveDate),
    Shift(ShiftRecord),
    Skipped(RowParseSkipped),
}

/// The first innermost table (no nested tables) with a row of two or more
/// cells. HTML emails wrap content in layout tables, which this skips.
fn find_schedule_table(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&TABLE).find(|table| {
        let nested = table
            .descendants()
            .skip(1)
            .filter_map(|node| node.value().as_element())
            .any(|element| element.name() == "table");

        !nested && table.select(&ROW).any(|row| row.select(&CELL).count() >= 2)
    })
}

fn parse_row(
    row: ElementRef<'_>,
    index: usize,
    received: NaiveDate,
    previous: Option<NaiveDate>,
) -> RowOutcome {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
    let texts: Vec<String> = cells.iter().map(|cell| cell_text(*cell)).collect();

    let header_only = cells.iter().all(|cell| cell.value().name() == "th");
    if texts.iter().all(|t| t.is_empty()) || header_only {
        return RowOutcome::Ignored;
    }

    let raw_label = texts
        .iter()
        .filter(|t| !t.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" | ");
    let skipped = |reason| {
        RowOutcome::Skipped(RowParseSkipped {
            row: index,
            raw_label: raw_label.clone(),
            reason,
        })
    };

    let Some((date_index, partial)) = texts
        .iter()
        .enumerate()
        .find_map(|(i, text)| parse_date_cell(text).map(|d| (i, d)))
    else {
        // Label rows such as "Date | Shift" written with <td>
        if !texts.iter().any(|t| t.chars().any(|c| c.is_ascii_digit())) {
            return RowOutcome::Ignored;
        }
        return skipped(SkipReason::MissingDate);
    };

    let Some(date) = partial.resolve(received, previous) else {
        return skipped(SkipReason::InvalidDate(texts[date_index].clone()));
    };

    let others = texts
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_index)
        .map(|(_, text)| text);

    let mut first_unrecognized: Option<&String> = None;
    for text in others {
        match parse_shift_cell(text) {
            Some(ShiftCell::Off) => return RowOutcome::DayOff(date),
            Some(ShiftCell::Hours { start, end }) => {
                return match ShiftRecord::new(date, start, end, raw_label.clone()) {
                    Some(record) => RowOutcome::Shift(record),
                    None => skipped(SkipReason::InvertedTimeRange(text.clone())),
                };
            }
            Some(ShiftCell::Invalid(reason)) => return skipped(reason),
            None if first_unrecognized.is_none() && !text.is_empty() => {
                first_unrecognized = Some(text);
            }
            None => {}
        }
    }

    skipped(SkipReason::UnrecognizedShift(
        first_unrecognized.cloned().unwrap_or_default(),
    ))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn html_table(rows: &[&[&str]]) -> String {
        let body: String = rows
            .iter()
            .map(|cells| {
                let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
                format!("<tr>{tds}</tr>")
            })
            .collect();
        format!("<html><body><table>{body}</table></body></html>")
    }

    fn shift(y: i32, m: u32, d: u32, start: (u32, u32), end: (u32, u32)) -> (NaiveDate, NaiveTime, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        )
    }

    fn received(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn triples(schedule: &ParsedSchedule) -> Vec<(NaiveDate, NaiveTime, NaiveTime)> {
        schedule
            .records
            .iter()
            .map(|r| (r.date, r.start_time, r.end_time))
            .collect()
    }

    #[test]
    fn weekly_table_with_a_day_off() {
        let html = html_table(&[
            &["Mon 2024-01-08", "09:00-17:00"],
            &["Tue 2024-01-09", "off"],
            &["Wed 2024-01-10", "13:00-21:00"],
        ]);

        let schedule = parse(&html, received(2024, 1, 5)).unwrap();

        assert_eq!(
            triples(&schedule),
            vec![
                shift(2024, 1, 8, (9, 0), (17, 0)),
                shift(2024, 1, 10, (13, 0), (21, 0)),
            ]
        );
        assert!(schedule.skipped.is_empty());
        assert_eq!(schedule.records[0].raw_label, "Mon 2024-01-08 | 09:00-17:00");
    }

    #[test]
    fn malformed_row_is_skipped_not_fatal() {
        let html = html_table(&[
            &["Mon 2024-01-08", "09:00-17:00"],
            &["Tue 2024-01-09", "nine to five-ish"],
        ]);

        let schedule = parse(&html, received(2024, 1, 5)).unwrap();

        assert_eq!(schedule.records.len(), 1);
        assert_eq!(
            schedule.skipped,
            vec![RowParseSkipped {
                row: 1,
                raw_label: "Tue 2024-01-09 | nine to five-ish".to_string(),
                reason: SkipReason::UnrecognizedShift("nine to five-ish".to_string()),
            }]
        );
    }

    #[test]
    fn missing_table_is_an_error() {
        let result = parse(
            "<html><body><p>No schedule this week</p></body></html>",
            received(2024, 1, 5),
        );
        assert!(matches!(result, Err(ShiftSyncError::NoScheduleTableFound)));
    }

    #[test]
    fn layout_tables_are_skipped() {
        let html = r#"
            <table class="layout"><tr><td>
              <table class="header"><tr><td><img src="logo.png"></td></tr></table>
              <table>
                <tr><th>Day</th><th>Date</th><th>Hours</th><th>Location</th></tr>
                <tr><td>Monday</td><td>8 Jan</td><td>9h00 à 17h00</td><td>Store 12</td></tr>
                <tr><td>Tuesday</td><td>9 Jan</td><td>Congé</td><td></td></tr>
              </table>
            </td></tr></table>"#;

        let schedule = parse(html, received(2024, 1, 5)).unwrap();

        assert_eq!(triples(&schedule), vec![shift(2024, 1, 8, (9, 0), (17, 0))]);
        assert!(schedule.skipped.is_empty());
    }

    #[test]
    fn blank_and_label_rows_are_ignored() {
        let html = html_table(&[
            &["Date", "Shift"],
            &["", ""],
            &["08/01", "9am-5pm"],
        ]);

        let schedule = parse(&html, received(2024, 1, 5)).unwrap();

        assert_eq!(triples(&schedule), vec![shift(2024, 1, 8, (9, 0), (17, 0))]);
        assert!(schedule.skipped.is_empty());
    }

    #[test]
    fn rows_without_a_date_are_reported() {
        let html = html_table(&[&["Week 2", "09:00-17:00"], &["30/02", "09:00-17:00"]]);

        let schedule = parse(&html, received(2024, 1, 5)).unwrap();

        assert!(schedule.records.is_empty());
        assert_eq!(schedule.skipped[0].reason, SkipReason::MissingDate);
        assert_eq!(schedule.skipped[1].reason, SkipReason::InvalidDate("30/02".to_string()));
    }

    #[test]
    fn inverted_range_is_reported() {
        let html = html_table(&[&["2024-01-08", "17:00-09:00"]]);

        let schedule = parse(&html, received(2024, 1, 5)).unwrap();

        assert!(schedule.records.is_empty());
        assert_eq!(
            schedule.skipped[0].reason,
            SkipReason::InvertedTimeRange("17:00-09:00".to_string())
        );
    }

    #[test]
    fn year_rolls_over_mid_table() {
        let html = html_table(&[&["Dec 31", "09:00-17:00"], &["Jan 2", "09:00-17:00"]]);

        let schedule = parse(&html, received(2024, 12, 20)).unwrap();

        assert_eq!(
            triples(&schedule),
            vec![
                shift(2024, 12, 31, (9, 0), (17, 0)),
                shift(2025, 1, 2, (9, 0), (17, 0)),
            ]
        );
    }

    #[test]
    fn document_order_is_preserved() {
        let html = html_table(&[
            &["2024-01-10", "13:00-21:00"],
            &["2024-01-08", "09:00-17:00"],
        ]);

        let schedule = parse(&html, received(2024, 1, 5)).unwrap();

        assert_eq!(schedule.records[0].date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(schedule.records[1].date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }
}
