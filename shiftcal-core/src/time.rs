//! Local date and wall-clock time helpers.
//!
//! Shift dates are stored as bare `YYYY-MM-DD` strings and always mean a
//! local calendar day. They are split into components by hand so that no
//! offset is ever applied on the way in or out.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::error::{ShiftError, ShiftResult};

/// Parse a `YYYY-MM-DD` string into a local calendar date.
///
/// Components must be exactly 4, 2 and 2 digits wide, so every accepted
/// string formats back to itself.
pub fn parse_local_date(s: &str) -> ShiftResult<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return Err(ShiftError::Format(format!(
            "Invalid date '{s}'. Expected YYYY-MM-DD"
        )));
    };

    let year: i32 = parse_component(year, 4, s)?;
    let month: u32 = parse_component(month, 2, s)?;
    let day: u32 = parse_component(day, 2, s)?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ShiftError::Format(format!("Date '{s}' does not exist")))
}

fn parse_component<T: std::str::FromStr>(part: &str, width: usize, whole: &str) -> ShiftResult<T> {
    if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ShiftError::Format(format!(
            "Invalid date '{whole}'. Expected YYYY-MM-DD"
        )));
    }
    part.parse()
        .map_err(|_| ShiftError::Format(format!("Date component '{part}' is out of range")))
}

/// Format a local date as `YYYY-MM-DD`.
pub fn format_local_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// True iff `s` is a 24-hour `HH:MM` time. Both hour digits are required, so
/// "07:30" is valid and "7:30" is not.
pub fn is_valid_time_string(s: &str) -> bool {
    let &[h1, h2, b':', m1, m2] = s.as_bytes() else {
        return false;
    };

    let hour_ok = match h1 {
        b'0' | b'1' => h2.is_ascii_digit(),
        b'2' => (b'0'..=b'3').contains(&h2),
        _ => false,
    };
    let minute_ok = (b'0'..=b'5').contains(&m1) && m2.is_ascii_digit();

    hour_ok && minute_ok
}

/// Parse an `HH:MM` string into a time of day.
pub fn parse_time(s: &str) -> ShiftResult<NaiveTime> {
    if !is_valid_time_string(s) {
        return Err(ShiftError::Validation(format!(
            "Invalid time '{s}'. Expected 24-hour HH:MM"
        )));
    }

    let digit = |i: usize| u32::from(s.as_bytes()[i] - b'0');
    let hour = digit(0) * 10 + digit(1);
    let minute = digit(3) * 10 + digit(4);

    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| ShiftError::Validation(format!("Invalid time '{s}'")))
}

/// Format a time of day as `HH:MM`.
pub fn format_time(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Trim a backend `HH:MM:SS` time column down to `HH:MM`.
///
/// Anything that isn't in that shape is returned unchanged and left for
/// validation to reject.
pub(crate) fn normalize_time_column(s: &str) -> String {
    match s.as_bytes() {
        [_, _, b':', _, _, b':', _, _, ..] => s[..5].to_string(),
        _ => s.to_string(),
    }
}
