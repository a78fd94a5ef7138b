//! Responses record CSV I/O (spec §6, SPEC_FULL §4.11) and the free-text
//! event-date parser, grounded on
//! `original_source/csv_loader.py::parse_event_date` (`"Month Day - H[AM/PM]"`,
//! e.g. `"March 5 - 4PM"`) and `csv_loader.py::convert_to_json`'s response
//! column names.

use crate::error::{IoError, Result};
use scheduler_core::models::{Role, SwitchPreference};
use serde::Deserialize;
use std::path::Path;

/// One row of `responses.csv`.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub timestamp: String,
    pub email: String,
    pub primary_role: Role,
    pub switch_pref: SwitchPreference,
    pub event_limit: u32,
    /// Raw date strings as they appeared in the `Availability` column,
    /// e.g. `"March 5 - 4PM"`, in the order the respondent listed them.
    pub availability_raw: Vec<String>,
    pub min_interval_days: i64,
    /// SPEC_FULL §4.11: an optional per-response duration override,
    /// applied to any event date this response is the first to mention.
    pub duration_override_minutes: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseRow {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Email Address")]
    email: String,
    #[serde(rename = "Preferred Role")]
    primary_role: String,
    #[serde(rename = "Secondary Role")]
    secondary_role: String,
    #[serde(rename = "Max Sessions")]
    max_sessions: String,
    #[serde(rename = "Availability")]
    availability: String,
    #[serde(rename = "Min Interval Days", default)]
    min_interval_days: String,
    #[serde(rename = "Event Duration Override", default)]
    duration_override: String,
}

fn parse_row(row: ResponseRow, path: &str, line: usize) -> Result<ResponseRecord> {
    let primary_role = Role::parse(&row.primary_role)?;
    let switch_pref = SwitchPreference::parse(&row.secondary_role)?;
    let event_limit: u32 = row.max_sessions.trim().parse().map_err(|_| IoError::InvalidValue {
        path: path.to_string(),
        row: line,
        column: "Max Sessions",
        value: row.max_sessions.clone(),
        reason: "not an integer".to_string(),
    })?;
    let min_interval_days: i64 = if row.min_interval_days.trim().is_empty() {
        0
    } else {
        row.min_interval_days
            .trim()
            .parse()
            .map_err(|_| IoError::InvalidValue {
                path: path.to_string(),
                row: line,
                column: "Min Interval Days",
                value: row.min_interval_days.clone(),
                reason: "not an integer".to_string(),
            })?
    };
    let duration_override_minutes = if row.duration_override.trim().is_empty() {
        None
    } else {
        Some(
            row.duration_override
                .trim()
                .parse()
                .map_err(|_| IoError::InvalidValue {
                    path: path.to_string(),
                    row: line,
                    column: "Event Duration Override",
                    value: row.duration_override.clone(),
                    reason: "not an integer".to_string(),
                })?,
        )
    };
    let availability_raw = row
        .availability
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    Ok(ResponseRecord {
        timestamp: row.timestamp,
        email: row.email,
        primary_role,
        switch_pref,
        event_limit,
        availability_raw,
        min_interval_days,
        duration_override_minutes,
    })
}

/// Loads `responses.csv`, grounded on `csv_loader.py::convert_to_json`'s
/// column handling (comma-separated `Availability`, `Max Sessions` ->
/// `event_limit`).
pub fn load_responses_csv(path: impl AsRef<Path>) -> Result<Vec<ResponseRecord>> {
    let path_str = path.as_ref().display().to_string();
    let mut reader = csv::Reader::from_path(&path).map_err(|source| IoError::Csv {
        path: path_str.clone(),
        source,
    })?;

    let mut records = Vec::new();
    for (i, result) in reader.deserialize::<ResponseRow>().enumerate() {
        let row = result.map_err(|source| IoError::Csv {
            path: path_str.clone(),
            source,
        })?;
        records.push(parse_row(row, &path_str, i + 2)?);
    }
    Ok(records)
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Parses `"Month Day - H[AM/PM]"` (e.g. `"March 5 - 4PM"`) into unix-epoch
/// seconds at the given year, grounded on `csv_loader.py::parse_event_date`.
/// The source assumes the current year; this crate takes it as an explicit
/// parameter so callers (the CLI) control it rather than reading the clock
/// inside a library.
pub fn parse_event_date(raw: &str, year: i32) -> Result<i64> {
    let bad = || IoError::UnparsableEventDate(raw.to_string(), "expected 'Month Day - H[AM/PM]'".to_string());

    let (date_part, time_part) = raw.split_once('-').ok_or_else(bad)?;
    let date_part = date_part.trim();
    let time_part = time_part.trim();

    let mut date_words = date_part.split_whitespace();
    let month_word = date_words.next().ok_or_else(bad)?;
    let day_word = date_words.next().ok_or_else(bad)?;
    if date_words.next().is_some() {
        return Err(bad());
    }

    let month_idx = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(month_word))
        .ok_or_else(bad)?;
    let day: u32 = day_word.parse().map_err(|_| bad())?;

    let time_upper = time_part.to_uppercase();
    let (hour_str, is_pm) = if let Some(h) = time_upper.strip_suffix("PM") {
        (h, true)
    } else if let Some(h) = time_upper.strip_suffix("AM") {
        (h, false)
    } else {
        return Err(bad());
    };
    let mut hour: u32 = hour_str.trim().parse().map_err(|_| bad())?;
    if hour == 12 {
        hour = 0;
    }
    if is_pm {
        hour += 12;
    }

    let date = chrono::NaiveDate::from_ymd_opt(year, month_idx as u32 + 1, day).ok_or_else(bad)?;
    let time = chrono::NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(bad)?;
    Ok(date.and_time(time).and_utc().timestamp())
}
