//! Voice command interpretation
//!
//! Turns a lowercase transcript into either a task description (taken
//! verbatim) or a calendar date spoken as `<day>[st|nd|rd|th] <month>`.
//! Month-first phrasing such as "november 21st" is not recognized.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::RecognitionFailure;

/// Day number, optional ordinal suffix, then an English month name
static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{1,2})(st|nd|rd|th)?\s*(january|february|march|april|may|june|july|august|september|october|november|december)",
    )
    .expect("valid regex")
});

/// Month names and their 1-based index
const MONTHS: [(&str, u32); 12] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Look up the 1-based month index for an English month name
#[must_use]
pub fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(month, _)| month.eq_ignore_ascii_case(name))
        .map(|&(_, number)| number)
}

/// Use a transcript as a task description
#[must_use]
pub fn task_description(transcript: &str) -> String {
    transcript.trim().to_string()
}

/// Find a spoken date in a transcript, resolved against the current local year
///
/// # Errors
///
/// Returns a `RecognitionFailure` when no date phrase is present, or it does
/// not name a real calendar date
pub fn parse_date(transcript: &str) -> Result<NaiveDate, RecognitionFailure> {
    parse_date_in_year(transcript, chrono::Local::now().year())
}

/// Find a spoken date in a transcript, resolved against `year`
///
/// # Errors
///
/// Returns a `RecognitionFailure` when no date phrase is present, or it does
/// not name a real calendar date
pub fn parse_date_in_year(transcript: &str, year: i32) -> Result<NaiveDate, RecognitionFailure> {
    let lowered = transcript.to_lowercase();
    let caps = DATE_REGEX
        .captures(&lowered)
        .ok_or(RecognitionFailure::NoDatePattern)?;

    let day: u32 = caps[1]
        .parse()
        .map_err(|_| RecognitionFailure::NoDatePattern)?;
    let month = month_number(&caps[3]).ok_or(RecognitionFailure::UnrecognizedMonth)?;

    tracing::debug!(day, month, year, "date phrase matched");

    NaiveDate::from_ymd_opt(year, month, day).ok_or(RecognitionFailure::InvalidDate)
}

/// Spoken confirmation for a resolved date, e.g. "March 3, 2025"
#[must_use]
pub fn spoken_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
