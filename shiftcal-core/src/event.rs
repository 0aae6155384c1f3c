//! Calendar events derived from shifts.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::{ShiftError, ShiftResult};
use crate::shift::Shift;
use crate::time::{parse_local_date, parse_time};

/// Suffix of every exported UID; calendar apps deduplicate on the full value.
const UID_DOMAIN: &str = "shiftcal";

/// A shift rendered as a timed event in local wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub uid: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_overtime: bool,
}

impl CalendarEvent {
    /// Convert a stored shift into its calendar event.
    ///
    /// A shift whose end time is earlier than its start time crosses midnight,
    /// so its end lands on the following calendar day. This applies to every
    /// shift kind; day shifts that would roll over are refused at input.
    pub fn from_shift(shift: &Shift) -> ShiftResult<Self> {
        let date = parse_local_date(&shift.date)?;
        let start_time = parse_time(&shift.start_time)?;
        let end_time = parse_time(&shift.end_time)?;

        let end_date = if crosses_midnight(start_time, end_time) {
            next_day(date)?
        } else {
            date
        };

        Ok(CalendarEvent {
            uid: event_uid(&shift.id),
            title: shift.kind.title().to_string(),
            start: date.and_time(start_time),
            end: end_date.and_time(end_time),
            is_overtime: shift.is_overtime,
        })
    }
}

/// Stable event identity for a shift id.
pub fn event_uid(shift_id: &str) -> String {
    format!("shift-{shift_id}@{UID_DOMAIN}")
}

fn crosses_midnight(start: NaiveTime, end: NaiveTime) -> bool {
    end < start
}

fn next_day(date: NaiveDate) -> ShiftResult<NaiveDate> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| ShiftError::Format(format!("No calendar day after {date}")))
}
