//! Terminal rendering for shifts and per-date outcomes.

use owo_colors::OwoColorize;
use shiftcal_core::store::DateOutcome;
use shiftcal_core::time::parse_local_date;
use shiftcal_core::{CalendarEvent, Shift};

/// One line per shift: date, kind, hours, flags and id.
pub fn shift_line(shift: &Shift) -> String {
    let date_label = parse_local_date(&shift.date)
        .map(|d| d.format("%a %Y-%m-%d").to_string())
        .unwrap_or_else(|_| shift.date.clone());

    // "+1" when the shift ends the next day
    let next_day = CalendarEvent::from_shift(shift)
        .map(|event| event.end.date() > event.start.date())
        .unwrap_or(false);

    let hours = format!(
        "{}-{}{}",
        shift.start_time,
        shift.end_time,
        if next_day { " (+1)" } else { "" }
    );

    let mut line = format!(
        "{}  {:<12}  {:<18}",
        date_label.bold(),
        shift.kind.title(),
        hours
    );
    if shift.is_overtime {
        line.push_str(&format!("  {}", "overtime".yellow()));
    }
    line.push_str(&format!("  {}", shift.id.dimmed()));
    line
}

pub fn outcome_line(outcome: &DateOutcome) -> String {
    match &outcome.error {
        None => format!("{} {}", "✓".green(), outcome.date),
        Some(error) => format!("{} {}  {}", "✗".red(), outcome.date, error.red()),
    }
}
