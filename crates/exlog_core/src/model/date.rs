//! Normalized entry dates.
//!
//! # Invariants
//! - Values are UTC instants truncated to millisecond precision, so the
//!   stored epoch milliseconds and the in-memory value always agree.
//! - Values stay within years 0000 through 9999, the range both renderings
//!   can express.
//! - `to_string()` followed by `parse()` yields the same instant.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const MILLIS_PER_DAY: i64 = 86_400_000;
/// 0000-01-01T00:00:00.000Z
const MIN_EPOCH_MS: i64 = -62_167_219_200_000;
/// 9999-12-31T23:59:59.999Z
const MAX_EPOCH_MS: i64 = 253_402_300_799_999;
const YEAR_DIGITS: usize = 4;
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Calendar timestamp attached to an exercise entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryDate(DateTime<Utc>);

/// Input text that no supported date format accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEntryDateError {
    input: String,
}

impl ParseEntryDateError {
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl Display for ParseEntryDateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported date `{}`", self.input)
    }
}

impl Error for ParseEntryDateError {}

impl EntryDate {
    /// Current instant, truncated to milliseconds.
    pub fn now() -> Self {
        let now = Utc::now();
        Self::truncated(now).unwrap_or(Self(now))
    }

    /// Builds a date from Unix epoch milliseconds.
    ///
    /// Returns `None` outside years 0000 through 9999.
    pub fn from_epoch_ms(epoch_ms: i64) -> Option<Self> {
        if !(MIN_EPOCH_MS..=MAX_EPOCH_MS).contains(&epoch_ms) {
            return None;
        }
        DateTime::from_timestamp_millis(epoch_ms).map(Self)
    }

    pub fn epoch_ms(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Whether the instant sits exactly on a UTC day boundary.
    pub fn is_midnight_utc(&self) -> bool {
        self.epoch_ms().rem_euclid(MILLIS_PER_DAY) == 0
    }

    fn truncated(value: DateTime<Utc>) -> Option<Self> {
        Self::from_epoch_ms(value.timestamp_millis())
    }
}

impl FromStr for EntryDate {
    type Err = ParseEntryDateError;

    /// Accepts `YYYY-MM-DD`, a bare `YYYY` (January 1st), RFC 3339, naive
    /// date-times (read as UTC) and integer epoch milliseconds.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || ParseEntryDateError {
            input: trimmed.to_string(),
        };

        if trimmed.len() == YEAR_DIGITS && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            let year = trimmed.parse::<i32>().map_err(|_| invalid())?;
            let midnight = NaiveDate::from_ymd_opt(year, 1, 1)
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .ok_or_else(invalid)?;
            return Self::truncated(midnight.and_utc()).ok_or_else(invalid);
        }

        if is_integer_literal(trimmed) {
            let epoch_ms = trimmed.parse::<i64>().map_err(|_| invalid())?;
            return Self::from_epoch_ms(epoch_ms).ok_or_else(invalid);
        }

        if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            let midnight = day.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
            return Self::truncated(midnight.and_utc()).ok_or_else(invalid);
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Self::truncated(parsed.with_timezone(&Utc)).ok_or_else(invalid);
        }

        NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .and_then(|naive| Self::truncated(naive.and_utc()))
            .ok_or_else(invalid)
    }
}

impl Display for EntryDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_midnight_utc() {
            write!(f, "{}", self.0.format("%Y-%m-%d"))
        } else {
            write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
    }
}

impl Serialize for EntryDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}
