//! Value formats: parsing editor text per kind and producing canonical forms

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use confed_schema::Kind;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Canonical date-time output format
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Canonical date output format
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Canonical time output format
pub const TIME_FORMAT: &str = "%H:%M:%S";

const DATE_TIME_INPUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_INPUTS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// The canonical representation of a scalar value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canonical {
    Text(String),
    /// Normalized decimal text
    Number(String),
    Boolean(bool),
}

/// Parse a decimal number, accepting plain and scientific notation
#[must_use]
pub fn parse_number(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Parse `true`/`false`, ignoring case and surrounding whitespace
#[must_use]
pub fn parse_boolean(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse a date-time; a bare date is taken at midnight
#[must_use]
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    DATE_TIME_INPUTS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a date, or extract the date component of a date-time
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .ok()
        .or_else(|| parse_date_time(text).map(|dt| dt.date()))
}

/// Parse a time, or extract the time component of a date-time
#[must_use]
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let trimmed = text.trim();
    TIME_INPUTS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .or_else(|| parse_date_time(text).map(|dt| dt.time()))
}

/// Whether `text` parses according to `kind`. Strings and composites always do.
#[must_use]
pub fn parses_as(kind: Kind, text: &str) -> bool {
    match kind {
        Kind::Number => parse_number(text).is_some(),
        Kind::Boolean => parse_boolean(text).is_some(),
        Kind::DateTime => parse_date_time(text).is_some(),
        Kind::DateOnly => parse_date(text).is_some(),
        Kind::TimeOnly => parse_time(text).is_some(),
        Kind::String | Kind::Object | Kind::Array => true,
    }
}

/// Convert editor text into its canonical form for `kind`
///
/// # Errors
///
/// Returns [`Error::Format`] when the text does not parse as `kind`.
pub fn canonical(kind: Kind, text: &str) -> Result<Canonical> {
    let fail = || Error::format(kind.as_str(), text);
    let canonical = match kind {
        Kind::Number => {
            Canonical::Number(parse_number(text).ok_or_else(fail)?.normalize().to_string())
        }
        Kind::Boolean => Canonical::Boolean(parse_boolean(text).ok_or_else(fail)?),
        Kind::DateTime => Canonical::Text(
            parse_date_time(text)
                .ok_or_else(fail)?
                .format(DATE_TIME_FORMAT)
                .to_string(),
        ),
        Kind::DateOnly => Canonical::Text(
            parse_date(text)
                .ok_or_else(fail)?
                .format(DATE_FORMAT)
                .to_string(),
        ),
        Kind::TimeOnly => Canonical::Text(
            parse_time(text)
                .ok_or_else(fail)?
                .format(TIME_FORMAT)
                .to_string(),
        ),
        Kind::String | Kind::Object | Kind::Array => Canonical::Text(text.to_string()),
    };
    Ok(canonical)
}
