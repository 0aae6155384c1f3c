//! Shift persistence.
//!
//! Every operation is scoped to the authenticated [`Principal`]. The REST
//! store additionally relies on the backend's row-level access policy, which
//! sees the principal's token.

mod memory;
mod rest;

use std::collections::BTreeSet;
use std::future::Future;

use serde::Serialize;

use crate::error::{ShiftError, ShiftResult};
use crate::identity::Principal;
use crate::shift::{NewShift, Shift};

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Most dates one bulk create or duplicate check may name.
pub const MAX_DATES_PER_REQUEST: usize = 366;

/// Reject a date selection larger than [`MAX_DATES_PER_REQUEST`].
pub fn check_date_count(count: usize) -> ShiftResult<()> {
    if count > MAX_DATES_PER_REQUEST {
        return Err(ShiftError::Validation(format!(
            "{count} dates selected; at most {MAX_DATES_PER_REQUEST} are allowed at once"
        )));
    }
    Ok(())
}

pub trait ShiftStore: Send + Sync {
    /// Validate and persist one shift for the principal.
    fn create(
        &self,
        principal: &Principal,
        shift: NewShift,
    ) -> impl Future<Output = ShiftResult<Shift>> + Send;

    /// The principal's shifts, ordered by date then start time.
    fn list(&self, principal: &Principal) -> impl Future<Output = ShiftResult<Vec<Shift>>> + Send;

    /// Delete one of the principal's shifts. Unknown ids and other users'
    /// shifts are left alone.
    fn delete(&self, principal: &Principal, id: &str)
    -> impl Future<Output = ShiftResult<()>> + Send;

    /// Which of `dates` (canonical `YYYY-MM-DD`) already hold a shift.
    fn dates_with_shifts(
        &self,
        principal: &Principal,
        dates: &[String],
    ) -> impl Future<Output = ShiftResult<BTreeSet<String>>> + Send;
}

/// Outcome of creating the shift for one selected date.
#[derive(Debug, Clone, Serialize)]
pub struct DateOutcome {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<Shift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DateOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Create `template` once per date, independently.
///
/// A failure on one date doesn't stop or undo the others; every date gets
/// its own outcome, in input order.
pub async fn create_many<S: ShiftStore>(
    store: &S,
    principal: &Principal,
    template: &NewShift,
    dates: &[String],
) -> Vec<DateOutcome> {
    let mut outcomes = Vec::with_capacity(dates.len());

    for date in dates {
        let shift = NewShift {
            date: date.clone(),
            ..template.clone()
        };

        let outcome = match store.create(principal, shift).await {
            Ok(shift) => DateOutcome {
                date: date.clone(),
                shift: Some(shift),
                error: None,
            },
            Err(e) => {
                tracing::warn!(%date, error = %e, "failed to create shift");
                DateOutcome {
                    date: date.clone(),
                    shift: None,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

/// The store selected by configuration.
#[derive(Debug)]
pub enum Store {
    Memory(MemoryStore),
    Rest(RestStore),
}

impl ShiftStore for Store {
    async fn create(&self, principal: &Principal, shift: NewShift) -> ShiftResult<Shift> {
        match self {
            Store::Memory(store) => store.create(principal, shift).await,
            Store::Rest(store) => store.create(principal, shift).await,
        }
    }

    async fn list(&self, principal: &Principal) -> ShiftResult<Vec<Shift>> {
        match self {
            Store::Memory(store) => store.list(principal).await,
            Store::Rest(store) => store.list(principal).await,
        }
    }

    async fn delete(&self, principal: &Principal, id: &str) -> ShiftResult<()> {
        match self {
            Store::Memory(store) => store.delete(principal, id).await,
            Store::Rest(store) => store.delete(principal, id).await,
        }
    }

    async fn dates_with_shifts(
        &self,
        principal: &Principal,
        dates: &[String],
    ) -> ShiftResult<BTreeSet<String>> {
        match self {
            Store::Memory(store) => store.dates_with_shifts(principal, dates).await,
            Store::Rest(store) => store.dates_with_shifts(principal, dates).await,
        }
    }
}
