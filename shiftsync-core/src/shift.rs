//! Shift records extracted from a schedule table.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::window::{LocalTimeGap, TimeWindow};

/// One working shift: a local date with a start and end time-of-day.
///
/// Rows marked as a day off never become a `ShiftRecord`, so both times are
/// always present and `start_time < end_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Original row text, for diagnostics only.
    pub raw_label: String,
}

impl ShiftRecord {
    /// Returns `None` when `start_time >= end_time`.
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        raw_label: impl Into<String>,
    ) -> Option<Self> {
        if start_time >= end_time {
            return None;
        }
        Some(ShiftRecord {
            date,
            start_time,
            end_time,
            raw_label: raw_label.into(),
        })
    }

    /// The shift as absolute instants, interpreting its times in `tz`.
    pub fn window(&self, tz: Tz) -> Result<TimeWindow, LocalTimeGap> {
        TimeWindow::from_local(
            self.date.and_time(self.start_time),
            self.date.and_time(self.end_time),
            tz,
        )
    }
}

impl fmt::Display for ShiftRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.date.format("%a %Y-%m-%d"),
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn rejects_inverted_or_empty_ranges() {
        assert!(ShiftRecord::new(date(2024, 1, 8), time(17, 0), time(9, 0), "x").is_none());
        assert!(ShiftRecord::new(date(2024, 1, 8), time(9, 0), time(9, 0), "x").is_none());
        assert!(ShiftRecord::new(date(2024, 1, 8), time(9, 0), time(9, 1), "x").is_some());
    }

    #[test]
    fn window_applies_configured_zone() {
        let record = ShiftRecord::new(date(2024, 1, 8), time(9, 0), time(17, 0), "Mon").unwrap();
        let window = record.window(chrono_tz::America::Toronto).unwrap();

        // EST is UTC-5 in January
        assert_eq!(window.start.to_rfc3339(), "2024-01-08T14:00:00+00:00");
        assert_eq!(window.end.to_rfc3339(), "2024-01-08T22:00:00+00:00");
    }

    #[test]
    fn display_is_compact() {
        let record = ShiftRecord::new(date(2024, 1, 10), time(13, 0), time(21, 0), "Wed").unwrap();
        assert_eq!(record.to_string(), "Wed 2024-01-10 13:00-21:00");
    }
}
