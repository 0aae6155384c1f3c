//! Advisory check for dates that already hold a shift.

use std::collections::BTreeSet;

use crate::error::ShiftResult;
use crate::identity::Principal;
use crate::store::{ShiftStore, check_date_count};
use crate::time::{format_local_date, parse_local_date};

/// Return the candidate dates (sorted, without repeats) on which the
/// principal already has a shift.
///
/// Purely a read: the store itself never enforces one shift per date.
/// More than [`crate::store::MAX_DATES_PER_REQUEST`] candidates is a
/// validation error.
pub async fn find_duplicate_dates<S: ShiftStore>(
    store: &S,
    principal: &Principal,
    candidates: &[String],
) -> ShiftResult<Vec<String>> {
    check_date_count(candidates.len())?;

    let canonical: BTreeSet<String> = candidates
        .iter()
        .map(|date| parse_local_date(date).map(format_local_date))
        .collect::<ShiftResult<_>>()?;
    let canonical: Vec<String> = canonical.into_iter().collect();

    let existing = store.dates_with_shifts(principal, &canonical).await?;

    Ok(canonical
        .into_iter()
        .filter(|date| existing.contains(date))
        .collect())
}
