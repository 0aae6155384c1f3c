//! Core types for shiftcal.
//!
//! - `shift`, `time`: shift records and local date/time handling
//! - `event`, `ics`, `export`: turning shifts into an iCalendar file
//! - `store`, `duplicates`: persistence behind the `ShiftStore` trait
//! - `backend`, `identity`, `session`: the hosted backend and who is signed in

pub mod backend;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod event;
pub mod export;
pub mod ics;
pub mod identity;
pub mod session;
pub mod shift;
pub mod store;
pub mod time;

pub use error::{ShiftError, ShiftResult};
pub use event::CalendarEvent;
pub use identity::Principal;
pub use shift::{NewShift, Shift, ShiftKind, UserId};
