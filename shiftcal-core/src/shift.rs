//! Shift records as stored by the backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ShiftError, ShiftResult};
use crate::time::{parse_local_date, parse_time};

/// Identifier of the user a shift belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftKind {
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "night")]
    Night,
    #[serde(rename = "8hour")]
    EightHour,
}

impl ShiftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftKind::Day => "day",
            ShiftKind::Night => "night",
            ShiftKind::EightHour => "8hour",
        }
    }

    /// Event title used in calendar exports.
    pub fn title(&self) -> &'static str {
        match self {
            ShiftKind::Day => "Day Shift",
            ShiftKind::Night => "Night Shift",
            ShiftKind::EightHour => "8-Hour Shift",
        }
    }

    /// Start and end times offered when the user doesn't pick their own.
    pub fn default_times(&self) -> (&'static str, &'static str) {
        match self {
            ShiftKind::Day => ("07:00", "19:00"),
            ShiftKind::Night => ("19:00", "07:00"),
            ShiftKind::EightHour => ("07:00", "15:00"),
        }
    }
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftKind {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(ShiftKind::Day),
            "night" => Ok(ShiftKind::Night),
            "8hour" | "8-hour" | "eight-hour" => Ok(ShiftKind::EightHour),
            other => Err(ShiftError::Validation(format!(
                "Unknown shift type '{other}'. Expected day, night or 8hour"
            ))),
        }
    }
}

/// A shift as persisted in the `shifts` relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    /// Local calendar day, `YYYY-MM-DD`.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: ShiftKind,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub is_overtime: bool,
    pub created_at: DateTime<Utc>,
}

/// Backends hand out either uuid strings or bigint ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// A shift about to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShift {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: ShiftKind,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub is_overtime: bool,
}

impl NewShift {
    /// A shift on `date` using the kind's default hours.
    pub fn with_default_times(date: impl Into<String>, kind: ShiftKind) -> Self {
        let (start, end) = kind.default_times();
        NewShift {
            date: date.into(),
            kind,
            start_time: start.to_string(),
            end_time: end.to_string(),
            is_overtime: false,
        }
    }

    /// Check the shift before it reaches the store.
    ///
    /// A shift with identical start and end is rejected, as is a day shift
    /// whose end is not after its start: day shifts never cross midnight.
    pub fn validated(self) -> ShiftResult<Self> {
        parse_local_date(&self.date)?;
        let start = parse_time(&self.start_time)?;
        let end = parse_time(&self.end_time)?;

        if start == end {
            return Err(ShiftError::Validation(format!(
                "Shift on {} starts and ends at {}",
                self.date, self.start_time
            )));
        }

        if self.kind == ShiftKind::Day && end < start {
            return Err(ShiftError::Validation(format!(
                "Day shift on {} ends ({}) before it starts ({})",
                self.date, self.end_time, self.start_time
            )));
        }

        Ok(self)
    }
}
