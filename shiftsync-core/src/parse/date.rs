//! Tolerant day/month grammar for the date column.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::text::normalize;

/// A date as written in the table; the year may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PartialDate {
    pub day: u32,
    pub month: u32,
    pub year: Option<i32>,
}

/// A yearless date lands within this many days of its anchor, or not at all.
const HALF_YEAR_DAYS: i64 = 184;

static ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("static regex"));

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})(?:[/.\-](\d{4}|\d{2}))?\.?$").expect("static regex")
});

static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?:st|nd|rd|th|er)?\.?\s*(?:de\s+)?([a-z]+)\.?,?(?:\s+(\d{4}))?$")
        .expect("static regex")
});

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th|er)?,?(?:\s+(\d{4}))?$")
        .expect("static regex")
});

static WEEKDAY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun|monday|tuesday|wednesday|thursday|friday|saturday|sunday|lun|mar|mer|jeu|ven|sam|dim|lundi|mardi|mercredi|jeudi|vendredi|samedi|dimanche)\.?,?\s+(?:le\s+)?",
    )
    .expect("static regex")
});

/// Parses one cell. Returns `None` when the text is not a date at all.
pub(crate) fn parse_date_cell(raw: &str) -> Option<PartialDate> {
    let text = normalize(raw);
    if text.is_empty() {
        return None;
    }

    // "Mar 8" is March 8th, but "mar 8 jan" is Tuesday 8 January: try the
    // whole text before stripping a weekday.
    parse_plain(&text).or_else(|| {
        let stripped = WEEKDAY_PREFIX.replace(&text, "");
        if stripped.len() == text.len() {
            None
        } else {
            parse_plain(&stripped)
        }
    })
}

fn parse_plain(text: &str) -> Option<PartialDate> {
    if let Some(caps) = ISO.captures(text) {
        return checked(caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok());
    }

    if let Some(caps) = NUMERIC.captures(text) {
        let year = caps.get(3).and_then(|y| expand_year(y.as_str()));
        return checked(caps[1].parse().ok()?, caps[2].parse().ok()?, year);
    }

    if let Some(caps) = DAY_MONTH.captures(text) {
        let month = month_number(&caps[2])?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        return checked(caps[1].parse().ok()?, month, year);
    }

    if let Some(caps) = MONTH_DAY.captures(text) {
        let month = month_number(&caps[1])?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        return checked(caps[2].parse().ok()?, month, year);
    }

    None
}

fn checked(day: u32, month: u32, year: Option<i32>) -> Option<PartialDate> {
    if (1..=31).contains(&day) && (1..=12).contains(&month) {
        Some(PartialDate { day, month, year })
    } else {
        None
    }
}

fn expand_year(text: &str) -> Option<i32> {
    let year: i32 = text.parse().ok()?;
    Some(if text.len() == 2 { 2000 + year } else { year })
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "jan" | "january" | "janv" | "janvier" => 1,
        "feb" | "february" | "fev" | "fevr" | "fevrier" => 2,
        "mar" | "march" | "mars" => 3,
        "apr" | "april" | "avr" | "avril" => 4,
        "may" | "mai" => 5,
        "jun" | "june" | "juin" => 6,
        "jul" | "july" | "juil" | "juillet" => 7,
        "aug" | "august" | "aout" => 8,
        "sep" | "sept" | "september" | "septembre" => 9,
        "oct" | "october" | "octobre" => 10,
        "nov" | "november" | "novembre" => 11,
        "dec" | "december" | "decembre" => 12,
        _ => return None,
    };
    Some(month)
}

impl PartialDate {
    /// Fixes the year. Explicit years win; otherwise the date goes in the
    /// year that puts it nearest its anchor: the previous row's date, or
    /// `received` for the first row. A schedule sent in late December for
    /// early January lands in the next year, and the reverse in the prior one.
    ///
    /// `None` when the day does not exist in that month (e.g. 30 February).
    pub(crate) fn resolve(
        &self,
        received: NaiveDate,
        previous: Option<NaiveDate>,
    ) -> Option<NaiveDate> {
        if let Some(year) = self.year {
            return NaiveDate::from_ymd_opt(year, self.month, self.day);
        }

        let anchor = previous.unwrap_or(received);
        let distance = |date: &NaiveDate| (*date - anchor).num_days().abs();

        [anchor.year() - 1, anchor.year(), anchor.year() + 1]
            .into_iter()
            .filter_map(|year| NaiveDate::from_ymd_opt(year, self.month, self.day))
            .filter(|date| distance(date) <= HALF_YEAR_DAYS)
            .min_by_key(&distance)
    }
}
