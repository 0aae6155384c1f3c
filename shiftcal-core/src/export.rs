//! Exporting a user's shifts as one calendar file.

use crate::error::{ShiftError, ShiftResult};
use crate::event::CalendarEvent;
use crate::ics::{IcsOptions, generate_ics};
use crate::identity::Principal;
use crate::store::ShiftStore;

/// Filename offered to the browser/CLI for downloads.
pub const EXPORT_FILENAME: &str = "shifts.ics";

/// Build the .ics file for every shift the principal owns.
///
/// Having no shifts is reported as `NotFound` rather than producing an
/// empty calendar. A stored shift that can't be converted fails the whole
/// export as a serialization error naming the shift.
pub async fn export_calendar<S: ShiftStore>(
    store: &S,
    principal: &Principal,
    options: &IcsOptions,
) -> ShiftResult<String> {
    let shifts = store.list(principal).await?;

    if shifts.is_empty() {
        return Err(ShiftError::NotFound("No shifts found to export".into()));
    }

    let events = shifts
        .iter()
        .map(|shift| {
            CalendarEvent::from_shift(shift).map_err(|e| {
                ShiftError::Serialization(format!("Shift {} could not be exported: {e}", shift.id))
            })
        })
        .collect::<ShiftResult<Vec<_>>>()?;

    tracing::info!(user = %principal.user_id, events = events.len(), "exporting calendar");

    generate_ics(&events, options)
}
