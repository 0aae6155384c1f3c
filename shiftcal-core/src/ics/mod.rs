//! ICS file generation.
//!
//! Shifts are exported as a single VCALENDAR (RFC 5545) holding one VEVENT
//! per shift.

mod generate;

pub use generate::{IcsOptions, generate_ics};
