//! ICS file generation.

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Timelike,
    Utc,
};
use chrono_tz::{OffsetComponents, Tz};
use icalendar::{Calendar, Component, EventLike, Property};

use crate::error::{ShiftError, ShiftResult};
use crate::event::CalendarEvent;

const PRODID: &str = "-//shiftcal//EN";

/// Calendar-level settings applied to every exported event.
#[derive(Debug, Clone)]
pub struct IcsOptions {
    pub calendar_name: String,
    pub description: String,
    pub location: String,
    /// When set, times carry a TZID backed by a VTIMEZONE definition;
    /// otherwise they are floating local times.
    pub timezone: Option<Tz>,
}

impl Default for IcsOptions {
    fn default() -> Self {
        IcsOptions {
            calendar_name: "Shifts".to_string(),
            description: "Generated from shiftcal".to_string(),
            location: "Work".to_string(),
            timezone: None,
        }
    }
}

/// Generate .ics content holding one VEVENT per event.
pub fn generate_ics(events: &[CalendarEvent], options: &IcsOptions) -> ShiftResult<String> {
    if events.is_empty() {
        return Err(ShiftError::Serialization(
            "Refusing to write a calendar with no events".into(),
        ));
    }

    // One DTSTAMP for the whole file
    let dtstamp = format_utc(Utc::now());

    let mut cal = Calendar::new();

    for event in events {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&event.uid);
        ics_event.summary(&event.title);
        ics_event.add_property("DTSTAMP", &dtstamp);

        add_datetime_property(&mut ics_event, "DTSTART", event.start, options.timezone);
        add_datetime_property(&mut ics_event, "DTEND", event.end, options.timezone);

        if event.is_overtime {
            ics_event.description(&format!("{} (overtime)", options.description));
        } else {
            ics_event.description(&options.description);
        }
        ics_event.location(&options.location);

        ics_event.add_property("STATUS", "CONFIRMED");
        ics_event.add_property("SEQUENCE", "0");

        cal.push(ics_event.done());
    }

    let cal = cal.done();

    let timezone = match options.timezone {
        Some(tz) => timezone_definition(tz, events),
        None => Vec::new(),
    };

    Ok(finish_calendar(&cal.to_string(), options, &timezone))
}

/// Post-process the icalendar crate's output
/// - Replace PRODID with ours
/// - Add METHOD:PUBLISH and the calendar display name right after it
/// - Insert the VTIMEZONE lines (if any) ahead of the first VEVENT
/// - Normalize line endings to CRLF
fn finish_calendar(ics: &str, options: &IcsOptions, timezone: &[String]) -> String {
    let mut result = String::with_capacity(ics.len() + 128);
    let mut pending_timezone = timezone;

    for line in ics.lines() {
        if line == "BEGIN:VEVENT" {
            for tz_line in pending_timezone {
                result.push_str(tz_line);
                result.push_str("\r\n");
            }
            pending_timezone = &[];
        }

        if line.starts_with("PRODID:") {
            result.push_str(&format!("PRODID:{PRODID}\r\n"));
            result.push_str("METHOD:PUBLISH\r\n");
            result.push_str(&format!(
                "X-WR-CALNAME:{}\r\n",
                escape_text(&options.calendar_name)
            ));
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

/// Escape a TEXT value (RFC 5545 section 3.3.11)
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Add a local datetime property, floating or with a TZID parameter
fn add_datetime_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    datetime: NaiveDateTime,
    timezone: Option<Tz>,
) {
    let value = datetime.format("%Y%m%dT%H%M%S").to_string();
    match timezone {
        None => {
            ics_event.add_property(name, value);
        }
        Some(tz) => {
            let mut prop = Property::new(name, value);
            prop.add_parameter("TZID", tz.name());
            ics_event.append_property(prop);
        }
    }
}

/// Offset from UTC in seconds, and whether daylight saving is in effect
type Observance = (i32, bool);

fn observance_at(tz: Tz, utc: NaiveDateTime) -> Observance {
    let offset = tz.offset_from_utc_datetime(&utc);
    (
        offset.fix().local_minus_utc(),
        offset.dst_offset() != TimeDelta::zero(),
    )
}

/// VTIMEZONE lines for `tz`, listing every offset change from just before
/// the first event's year to the end of the last event's year.
///
/// Each change is its own STANDARD/DAYLIGHT block with a one-off DTSTART,
/// so no recurrence rules are needed.
fn timezone_definition(tz: Tz, events: &[CalendarEvent]) -> Vec<String> {
    let (first_year, last_year) = events.iter().fold((i32::MAX, i32::MIN), |(lo, hi), e| {
        (lo.min(e.start.year()), hi.max(e.end.year()))
    });
    let from = NaiveDate::from_ymd_opt(first_year, 1, 1).and_then(|d| d.pred_opt());
    let until = NaiveDate::from_ymd_opt(last_year.saturating_add(1), 1, 2);
    let (Some(from), Some(until)) = (from, until) else {
        return Vec::new();
    };

    let mut lines = vec!["BEGIN:VTIMEZONE".to_string(), format!("TZID:{}", tz.name())];

    let mut at = from.and_time(NaiveTime::MIN);
    let end = until.and_time(NaiveTime::MIN);
    let mut current = observance_at(tz, at);
    push_observance(&mut lines, at, current, current);

    while at < end {
        let next = at + TimeDelta::days(1);
        let next_observance = observance_at(tz, next);
        if next_observance != current {
            let change = find_transition(tz, at, next);
            push_observance(&mut lines, change, current, next_observance);
            current = next_observance;
        }
        at = next;
    }

    lines.push("END:VTIMEZONE".to_string());
    lines
}

/// First whole minute (UTC) in `(before, after]` whose observance differs
/// from the one at `before`.
fn find_transition(tz: Tz, mut before: NaiveDateTime, mut after: NaiveDateTime) -> NaiveDateTime {
    let old = observance_at(tz, before);
    while after - before > TimeDelta::minutes(1) {
        let mid = before + (after - before) / 2;
        if observance_at(tz, mid) == old {
            before = mid;
        } else {
            after = mid;
        }
    }

    after
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(after)
}

fn push_observance(lines: &mut Vec<String>, utc: NaiveDateTime, from: Observance, to: Observance) {
    let kind = if to.1 { "DAYLIGHT" } else { "STANDARD" };
    // DTSTART is local time under the offset being left
    let local = utc + TimeDelta::seconds(i64::from(from.0));

    lines.push(format!("BEGIN:{kind}"));
    lines.push(format!("DTSTART:{}", local.format("%Y%m%dT%H%M%S")));
    lines.push(format!("TZOFFSETFROM:{}", format_offset(from.0)));
    lines.push(format!("TZOFFSETTO:{}", format_offset(to.0)));
    lines.push(format!("END:{kind}"));
}

/// UTC offset as `+HHMM`, or `+HHMMSS` when seconds are involved
fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let total = seconds.unsigned_abs();
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if secs == 0 {
        format!("{sign}{hours:02}{minutes:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_event(id: &str, day: u32, start_hour: u32, end_day: u32, end_hour: u32) -> CalendarEvent {
        CalendarEvent {
            uid: crate::event::event_uid(id),
            title: "Night Shift".to_string(),
            start: NaiveDate::from_ymd_opt(2025, 1, day)
                .unwrap()
                .and_hms_opt(start_hour, 0, 0)
                .unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, end_day)
                .unwrap()
                .and_hms_opt(end_hour, 0, 0)
                .unwrap(),
            is_overtime: false,
        }
    }

    #[test]
    fn test_generate_ics_one_vevent_per_event() {
        let events = vec![make_event("1", 2, 19, 3, 7), make_event("2", 4, 19, 5, 7)];
        let ics = generate_ics(&events, &IcsOptions::default()).unwrap();

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2, "ICS:\n{}", ics);
        assert_eq!(ics.matches("END:VEVENT").count(), 2);
        assert!(ics.contains("UID:shift-1@shiftcal"));
        assert!(ics.contains("UID:shift-2@shiftcal"));
    }

    #[test]
    fn test_generate_ics_required_fields() {
        let ics = generate_ics(&[make_event("1", 2, 19, 3, 7)], &IcsOptions::default()).unwrap();

        for needle in [
            "BEGIN:VCALENDAR",
            "VERSION:2.0",
            "PRODID:-//shiftcal//EN",
            "METHOD:PUBLISH",
            "X-WR-CALNAME:Shifts",
            "DTSTAMP:",
            "SUMMARY:Night Shift",
            "DESCRIPTION:Generated from shiftcal",
            "LOCATION:Work",
            "STATUS:CONFIRMED",
            "SEQUENCE:0",
            "END:VCALENDAR",
        ] {
            assert!(ics.contains(needle), "Missing {}. ICS:\n{}", needle, ics);
        }
    }

    #[test]
    fn test_generate_ics_times_are_floating_by_default() {
        let ics = generate_ics(&[make_event("1", 2, 19, 3, 7)], &IcsOptions::default()).unwrap();

        assert!(ics.contains("DTSTART:20250102T190000\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("DTEND:20250103T070000\r\n"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_with_timezone_adds_tzid() {
        let options = IcsOptions {
            timezone: Some(chrono_tz::Europe::Oslo),
            ..IcsOptions::default()
        };
        let ics = generate_ics(&[make_event("1", 2, 19, 3, 7)], &options).unwrap();

        assert!(
            ics.contains("DTSTART;TZID=Europe/Oslo:20250102T190000"),
            "ICS:\n{}",
            ics
        );
        assert!(ics.contains("DTEND;TZID=Europe/Oslo:20250103T070000"));
    }

    #[test]
    fn test_generate_ics_with_timezone_defines_it() {
        let options = IcsOptions {
            timezone: Some(chrono_tz::Europe::Oslo),
            ..IcsOptions::default()
        };
        let ics = generate_ics(&[make_event("1", 2, 19, 3, 7)], &options).unwrap();

        let vtimezone = ics.find("BEGIN:VTIMEZONE").expect("VTIMEZONE missing");
        let vevent = ics.find("BEGIN:VEVENT").unwrap();
        assert!(vtimezone < vevent, "ICS:\n{}", ics);
        assert_eq!(ics.matches("BEGIN:VTIMEZONE").count(), 1);
        assert!(ics.contains("TZID:Europe/Oslo\r\n"));

        // 2025 clock changes: 30 March 01:00 UTC and 26 October 01:00 UTC
        assert!(
            ics.contains(
                "BEGIN:DAYLIGHT\r\nDTSTART:20250330T020000\r\n\
                 TZOFFSETFROM:+0100\r\nTZOFFSETTO:+0200\r\nEND:DAYLIGHT\r\n"
            ),
            "ICS:\n{}",
            ics
        );
        assert!(
            ics.contains(
                "BEGIN:STANDARD\r\nDTSTART:20251026T030000\r\n\
                 TZOFFSETFROM:+0200\r\nTZOFFSETTO:+0100\r\nEND:STANDARD\r\n"
            ),
            "ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_timezone_without_dst_has_single_standard_block() {
        let options = IcsOptions {
            timezone: Some(chrono_tz::Asia::Tokyo),
            ..IcsOptions::default()
        };
        let ics = generate_ics(&[make_event("1", 2, 19, 3, 7)], &options).unwrap();

        assert_eq!(ics.matches("BEGIN:STANDARD").count(), 1, "ICS:\n{}", ics);
        assert!(!ics.contains("BEGIN:DAYLIGHT"));
        assert!(ics.contains("TZOFFSETTO:+0900"));
    }

    #[test]
    fn test_floating_times_have_no_vtimezone() {
        let ics = generate_ics(&[make_event("1", 2, 19, 3, 7)], &IcsOptions::default()).unwrap();
        assert!(!ics.contains("VTIMEZONE"));
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(3600), "+0100");
        assert_eq!(format_offset(-16200), "-0430");
        assert_eq!(format_offset(0), "+0000");
        assert_eq!(format_offset(-2670), "-004430");
    }

    #[test]
    fn test_generate_ics_marks_overtime() {
        let mut event = make_event("1", 2, 19, 3, 7);
        event.is_overtime = true;
        let ics = generate_ics(&[event], &IcsOptions::default()).unwrap();

        assert!(ics.contains("(overtime)"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_rejects_empty_input() {
        let err = generate_ics(&[], &IcsOptions::default()).unwrap_err();
        assert!(matches!(err, ShiftError::Serialization(_)));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("Ward 3; nights, A\\B"), "Ward 3\\; nights\\, A\\\\B");
    }
}
