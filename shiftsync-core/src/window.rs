//! Time windows and local-time conversion.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` interval of absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A local wall-clock time that does not exist in the zone (spring-forward gap).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTimeGap(pub NaiveDateTime);

impl fmt::Display for LocalTimeGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local time {} does not exist", self.0)
    }
}

impl std::error::Error for LocalTimeGap {}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        TimeWindow { start, end }
    }

    /// Builds a window from wall-clock times in `tz`.
    /// Ambiguous times (fall-back hour) resolve to the earlier instant.
    pub fn from_local(
        start: NaiveDateTime,
        end: NaiveDateTime,
        tz: Tz,
    ) -> Result<Self, LocalTimeGap> {
        Ok(TimeWindow {
            start: local_to_utc(start, tz)?,
            end: local_to_utc(end, tz)?,
        })
    }

    /// The whole local day of `date` in `tz`: midnight to next midnight.
    pub fn local_day(date: NaiveDate, tz: Tz) -> Self {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        TimeWindow {
            start: day_start(date, tz),
            end: day_start(next, tz),
        }
    }

    /// Whether the two windows share any instant.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

fn local_to_utc(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, LocalTimeGap> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(LocalTimeGap(local))
}

/// First existing instant of the local day. Zones that skip midnight (e.g. a
/// DST change at 00:00) start the day at 01:00.
fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    (0..=3)
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|local| local_to_utc(local, tz).ok())
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, h, m, 0).unwrap()
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let a = TimeWindow::new(utc(9, 0), utc(12, 0));
        let b = TimeWindow::new(utc(12, 0), utc(15, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn partial_and_nested_windows_overlap() {
        let shift = TimeWindow::new(utc(9, 0), utc(17, 0));
        assert!(shift.overlaps(&TimeWindow::new(utc(16, 59), utc(18, 0))));
        assert!(shift.overlaps(&TimeWindow::new(utc(10, 0), utc(11, 0))));
        assert!(shift.overlaps(&TimeWindow::new(utc(0, 0), utc(23, 0))));
    }

    #[test]
    fn local_day_spans_midnight_to_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let day = TimeWindow::local_day(date, chrono_tz::America::Toronto);
        assert_eq!(day.start, Utc.with_ymd_and_hms(2024, 1, 8, 5, 0, 0).unwrap());
        assert_eq!(day.end, Utc.with_ymd_and_hms(2024, 1, 9, 5, 0, 0).unwrap());
    }

    #[test]
    fn spring_forward_gap_is_reported() {
        // 2024-03-10 02:30 does not exist in Toronto
        let gap = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let end = gap + chrono::Duration::hours(4);
        let result = TimeWindow::from_local(gap, end, chrono_tz::America::Toronto);
        assert_eq!(result, Err(LocalTimeGap(gap)));
    }
}
