//! Process-local shift store, used for development and tests.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::error::ShiftResult;
use crate::identity::Principal;
use crate::shift::{NewShift, Shift};
use crate::store::ShiftStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    shifts: RwLock<Vec<Shift>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Shift>> {
        self.shifts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Shift>> {
        self.shifts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ShiftStore for MemoryStore {
    async fn create(&self, principal: &Principal, shift: NewShift) -> ShiftResult<Shift> {
        let shift = shift.validated()?;

        let stored = Shift {
            id: Uuid::new_v4().to_string(),
            owner: principal.user_id.clone(),
            date: shift.date,
            kind: shift.kind,
            start_time: shift.start_time,
            end_time: shift.end_time,
            is_overtime: shift.is_overtime,
            created_at: Utc::now(),
        };

        self.write().push(stored.clone());
        tracing::debug!(id = %stored.id, date = %stored.date, "shift created");

        Ok(stored)
    }

    async fn list(&self, principal: &Principal) -> ShiftResult<Vec<Shift>> {
        let mut shifts: Vec<Shift> = self
            .read()
            .iter()
            .filter(|s| s.owner == principal.user_id)
            .cloned()
            .collect();

        shifts.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.start_time.cmp(&b.start_time))
        });
        Ok(shifts)
    }

    async fn delete(&self, principal: &Principal, id: &str) -> ShiftResult<()> {
        let mut shifts = self.write();
        let before = shifts.len();
        shifts.retain(|s| !(s.id == id && s.owner == principal.user_id));

        if shifts.len() == before {
            tracing::debug!(%id, "delete matched no shift owned by caller");
        }
        Ok(())
    }

    async fn dates_with_shifts(
        &self,
        principal: &Principal,
        dates: &[String],
    ) -> ShiftResult<BTreeSet<String>> {
        let wanted: BTreeSet<&str> = dates.iter().map(String::as_str).collect();

        Ok(self
            .read()
            .iter()
            .filter(|s| s.owner == principal.user_id && wanted.contains(s.date.as_str()))
            .map(|s| s.date.clone())
            .collect())
    }
}
