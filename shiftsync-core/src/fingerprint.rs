//! Stable identities for shifts.
//!
//! A [`Fingerprint`] identifies a shift's *content*, a [`ShiftKey`] identifies
//! the *slot* it occupies in the schedule. Both are stored on the calendar
//! events shiftsync creates (see [`ShiftTag`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::shift::ShiftRecord;

/// Hex SHA-256 over `(date, start_time, end_time, title)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

/// Hex SHA-256 over `(date, title, ordinal)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftKey(String);

/// The private metadata that marks a calendar event as managed by shiftsync.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftTag {
    pub fingerprint: Fingerprint,
    pub shift_key: ShiftKey,
}

impl Fingerprint {
    pub fn of(record: &ShiftRecord, title: &str) -> Self {
        Fingerprint(digest(&[
            "shift",
            &record.date.format("%Y-%m-%d").to_string(),
            &record.start_time.format("%H:%M").to_string(),
            &record.end_time.format("%H:%M").to_string(),
            title,
        ]))
    }

    /// Wraps a value read back from a calendar event.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Fingerprint(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ShiftKey {
    /// `ordinal` is the position of the shift among the records sharing its date.
    pub fn of(record: &ShiftRecord, title: &str, ordinal: usize) -> Self {
        ShiftKey(digest(&[
            "slot",
            &record.date.format("%Y-%m-%d").to_string(),
            title,
            &ordinal.to_string(),
        ]))
    }

    pub fn from_stored(value: impl Into<String>) -> Self {
        ShiftKey(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ShiftTag {
    pub fn for_record(record: &ShiftRecord, title: &str, ordinal: usize) -> Self {
        ShiftTag {
            fingerprint: Fingerprint::of(record, title),
            shift_key: ShiftKey::of(record, title, ordinal),
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ShiftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields are length-prefixed so that no two field lists hash the same input.
fn digest(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Convenience for the common call site.
pub fn fingerprint(record: &ShiftRecord, title: &str) -> Fingerprint {
    Fingerprint::of(record, title)
}

pub fn shift_key(record: &ShiftRecord, title: &str, ordinal: usize) -> ShiftKey {
    ShiftKey::of(record, title, ordinal)
}
