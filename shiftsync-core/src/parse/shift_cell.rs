//! Recognises the shift column: a time range or an "off" marker.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use super::SkipReason;
use super::text::normalize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShiftCell {
    Off,
    Hours { start: NaiveTime, end: NaiveTime },
    /// Looks like a time range but cannot become a shift.
    Invalid(SkipReason),
}

const OFF_MARKERS: &[&str] = &[
    "off", "day off", "off day", "rest", "rest day", "rdo", "pto", "vacation", "holiday",
    "repos", "conge", "libre", "vacances", "ferie", "-", "--",
];

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<sh>\d{1,2})(?:[:h.]?(?P<sm>\d{2}))?h?(?:\s*(?P<sp>[ap])\.?\s*m\.?)?",
        r"\s*(?:-|to|until|till|a)\s*",
        r"(?P<eh>\d{1,2})(?:[:h.]?(?P<em>\d{2}))?h?(?:\s*(?P<ep>[ap])\.?\s*m\.?)?$",
    ))
    .expect("static regex")
});

static NOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Classifies one cell. `None` when the text is neither a range nor an off marker.
pub(crate) fn parse_shift_cell(raw: &str) -> Option<ShiftCell> {
    let text = normalize(&NOTES.replace_all(raw, " "));
    let trimmed = text.trim_end_matches(['.', '!']);

    if OFF_MARKERS.contains(&trimmed) {
        return Some(ShiftCell::Off);
    }

    let caps = RANGE.captures(trimmed)?;
    let number = |name: &str| -> u32 {
        caps.name(name)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let meridiem = |name: &str| {
        caps.name(name).map(|m| match m.as_str() {
            "a" => Meridiem::Am,
            _ => Meridiem::Pm,
        })
    };

    let (start_hour, start_min) = (number("sh"), number("sm"));
    let (end_hour, end_min) = (number("eh"), number("em"));
    let end_meridiem = meridiem("ep");

    // "1-5pm" means 13:00-17:00, but "9-5pm" means 09:00-17:00
    let start_meridiem = meridiem("sp").or_else(|| {
        let inherited = end_meridiem?;
        let start = to_time(start_hour, start_min, Some(inherited))?;
        let end = to_time(end_hour, end_min, end_meridiem)?;
        (start < end).then_some(inherited)
    });

    let cell = match (
        to_time(start_hour, start_min, start_meridiem),
        to_time(end_hour, end_min, end_meridiem),
    ) {
        (Some(start), Some(end)) if start < end => ShiftCell::Hours { start, end },
        (Some(_), Some(_)) => ShiftCell::Invalid(SkipReason::InvertedTimeRange(raw.trim().to_string())),
        _ => ShiftCell::Invalid(SkipReason::InvalidTime(raw.trim().to_string())),
    };
    Some(cell)
}

fn to_time(hour: u32, minute: u32, meridiem: Option<Meridiem>) -> Option<NaiveTime> {
    let hour = match meridiem {
        None => hour,
        Some(_) if !(1..=12).contains(&hour) => return None,
        Some(Meridiem::Am) => hour % 12,
        Some(Meridiem::Pm) => hour % 12 + 12,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(sh: u32, sm: u32, eh: u32, em: u32) -> Option<ShiftCell> {
        Some(ShiftCell::Hours {
            start: NaiveTime::from_hms_opt(sh, sm, 0).unwrap(),
            end: NaiveTime::from_hms_opt(eh, em, 0).unwrap(),
        })
    }

    #[test]
    fn twenty_four_hour_ranges() {
        assert_eq!(parse_shift_cell("09:00-17:00"), hours(9, 0, 17, 0));
        assert_eq!(parse_shift_cell("9:30 – 17:45"), hours(9, 30, 17, 45));
        assert_eq!(parse_shift_cell("13:00 to 21:00"), hours(13, 0, 21, 0));
        assert_eq!(parse_shift_cell("0900-1700"), hours(9, 0, 17, 0));
        assert_eq!(parse_shift_cell("9.00—17.00"), hours(9, 0, 17, 0));
    }

    #[test]
    fn french_style_ranges() {
        assert_eq!(parse_shift_cell("9h00 à 17h00"), hours(9, 0, 17, 0));
        assert_eq!(parse_shift_cell("9h-17h"), hours(9, 0, 17, 0));
        assert_eq!(parse_shift_cell("8h30-16h"), hours(8, 30, 16, 0));
    }

    #[test]
    fn twelve_hour_ranges() {
        assert_eq!(parse_shift_cell("9am - 5pm"), hours(9, 0, 17, 0));
        assert_eq!(parse_shift_cell("9:30 a.m. – 5 p.m."), hours(9, 30, 17, 0));
        assert_eq!(parse_shift_cell("1-5pm"), hours(13, 0, 17, 0));
        assert_eq!(parse_shift_cell("9-5pm"), hours(9, 0, 17, 0));
        assert_eq!(parse_shift_cell("12pm-8pm"), hours(12, 0, 20, 0));
    }

    #[test]
    fn notes_in_parentheses_are_ignored() {
        assert_eq!(parse_shift_cell("09:00-17:00 (cash)"), hours(9, 0, 17, 0));
    }

    #[test]
    fn off_markers_in_english_and_french() {
        for text in ["off", "OFF", "Day off", "Congé", "repos", "—", "Vacation!"] {
            assert_eq!(parse_shift_cell(text), Some(ShiftCell::Off), "{text}");
        }
    }

    #[test]
    fn impossible_times_are_invalid() {
        assert_eq!(
            parse_shift_cell("25:00-26:00"),
            Some(ShiftCell::Invalid(SkipReason::InvalidTime("25:00-26:00".into())))
        );
        assert_eq!(
            parse_shift_cell("09:75-17:00"),
            Some(ShiftCell::Invalid(SkipReason::InvalidTime("09:75-17:00".into())))
        );
    }

    #[test]
    fn inverted_and_overnight_ranges_are_rejected() {
        assert_eq!(
            parse_shift_cell("17:00-09:00"),
            Some(ShiftCell::Invalid(SkipReason::InvertedTimeRange("17:00-09:00".into())))
        );
        assert_eq!(
            parse_shift_cell("22:00-06:00"),
            Some(ShiftCell::Invalid(SkipReason::InvertedTimeRange("22:00-06:00".into())))
        );
    }

    #[test]
    fn unrelated_text_is_not_a_shift() {
        assert_eq!(parse_shift_cell("Store #12"), None);
        assert_eq!(parse_shift_cell("9ish until late"), None);
        assert_eq!(parse_shift_cell(""), None);
        assert_eq!(parse_shift_cell("Monday"), None);
    }
}
