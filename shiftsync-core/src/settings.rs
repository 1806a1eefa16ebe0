//! Per-run settings the core needs from configuration.

use chrono_tz::Tz;

use crate::error::{ShiftSyncError, ShiftSyncResult};

/// Read once at process start and never mutated during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Summary of every created event; part of each shift's identity.
    pub event_title: String,
    pub color_id: Option<String>,
    /// Zone applied to every time in the schedule table.
    pub timezone: Tz,
}

impl SyncSettings {
    pub fn new(
        event_title: impl Into<String>,
        color_id: Option<String>,
        timezone: &str,
    ) -> ShiftSyncResult<Self> {
        let timezone: Tz = timezone
            .parse()
            .map_err(|_| ShiftSyncError::InvalidTimezone(timezone.to_string()))?;

        let event_title = event_title.into();
        if event_title.trim().is_empty() {
            return Err(ShiftSyncError::Config("event_title must not be empty".into()));
        }

        Ok(SyncSettings {
            event_title,
            color_id: color_id.filter(|c| !c.trim().is_empty()),
            timezone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iana_zone() {
        let settings = SyncSettings::new("Work", Some("5".into()), "America/Toronto").unwrap();
        assert_eq!(settings.timezone, chrono_tz::America::Toronto);
        assert_eq!(settings.color_id.as_deref(), Some("5"));
    }

    #[test]
    fn rejects_unknown_zone_and_empty_title() {
        assert!(matches!(
            SyncSettings::new("Work", None, "Mars/Olympus"),
            Err(ShiftSyncError::InvalidTimezone(zone)) if zone == "Mars/Olympus"
        ));
        assert!(matches!(
            SyncSettings::new("  ", None, "UTC"),
            Err(ShiftSyncError::Config(_))
        ));
    }

    #[test]
    fn blank_color_means_calendar_default() {
        let settings = SyncSettings::new("Work", Some(String::new()), "UTC").unwrap();
        assert_eq!(settings.color_id, None);
    }
}
