//! Flexible datetime parser for truncation cutoffs.
//!
//! Supports multiple formats:
//! - RFC 3339 / ISO 8601: `2026-10-12T17:00:00Z`, `2026-10-12T17:00:00.123+02:00`
//! - Space-separated: `2026-10-12 17:00:00.123456+00:00` (naive input is UTC)
//! - Date only: `2026-10-12` (midnight UTC)
//! - Unix timestamp: `1791824400`
//! - Relative: `-7d`, `-12h`, `-30m`, `-90s`, `-1w`

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Error type for datetime parsing failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to parse datetime '{input}': {message}")]
pub struct TimeParseError {
    pub input: String,
    pub message: String,
}

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a datetime string, resolving relative expressions against now.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, TimeParseError> {
    parse_datetime_with_base(input, Utc::now())
}

/// Parses a datetime string using `base` as the reference for relative
/// expressions (`-7d` means `base - 7 days`).
pub fn parse_datetime_with_base(
    input: &str,
    base: DateTime<Utc>,
) -> Result<DateTime<Utc>, TimeParseError> {
    let input = input.trim();
    let error = |message: &str| TimeParseError {
        input: input.to_string(),
        message: message.to_string(),
    };

    if let Some(ts) = try_parse_unix_timestamp(input) {
        return Utc
            .timestamp_opt(ts, 0)
            .single()
            .ok_or_else(|| error("Unix timestamp out of range"));
    }

    if let Some(delta_secs) = try_parse_relative_delta_seconds(input) {
        return chrono::Duration::try_seconds(delta_secs)
            .and_then(|delta| base.checked_add_signed(delta))
            .ok_or_else(|| error("Relative time overflow"));
    }

    if let Some(dt) = try_parse_iso8601(input) {
        return Ok(dt);
    }

    if let Some(dt) = restore_plus_offset(input).and_then(|fixed| try_parse_iso8601(&fixed)) {
        return Ok(dt);
    }

    if let Some(dt) = try_parse_date_only(input) {
        return Ok(dt);
    }

    Err(error(
        "Unrecognized format. Use: ISO 8601 (2026-10-12T17:00:00Z), \
         date (2026-10-12), Unix timestamp (1791824400), or relative (-7d, -12h)",
    ))
}

/// Try to parse as Unix timestamp (plain integer).
fn try_parse_unix_timestamp(input: &str) -> Option<i64> {
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        input.parse::<i64>().ok()
    } else {
        None
    }
}

/// Parses a relative expression and returns delta seconds (negative value).
fn try_parse_relative_delta_seconds(input: &str) -> Option<i64> {
    let rest = input.strip_prefix('-')?;
    let unit = rest.chars().last()?;
    let number_str = &rest[..rest.len() - unit.len_utf8()];
    if number_str.is_empty() || !number_str.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let number: i64 = number_str.parse().ok()?;

    let seconds = match unit {
        's' => number,
        'm' => number.checked_mul(60)?,
        'h' => number.checked_mul(3600)?,
        'd' => number.checked_mul(86400)?,
        'w' => number.checked_mul(604800)?,
        _ => return None,
    };

    Some(-seconds)
}

/// Try to parse as ISO 8601 datetime, with or without offset.
fn try_parse_iso8601(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    // No offset: assume UTC
    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    None
}

/// Turns `... 12:34:56 00:00` back into `... 12:34:56+00:00`.
///
/// Query-string decoding maps an unescaped `+` to a space, so a positive
/// offset arrives separated from the time by a blank.
fn restore_plus_offset(input: &str) -> Option<String> {
    let (head, offset) = input.rsplit_once(' ')?;
    let digits: String = offset.chars().filter(|c| *c != ':').collect();
    let well_formed = digits.len() == 4
        && digits.chars().all(|c| c.is_ascii_digit())
        && (offset.len() == 4 || offset.as_bytes().get(2) == Some(&b':'));
    // The head must already carry a time, or `2026-10-12 17:00` would be read as an offset.
    if !well_formed || !head.contains(':') {
        return None;
    }
    Some(format!("{head}+{offset}"))
}

/// Try to parse as a bare date (midnight UTC).
fn try_parse_date_only(input: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}
