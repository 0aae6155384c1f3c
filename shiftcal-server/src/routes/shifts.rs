//! Shift endpoints (list, create, delete, duplicate check)

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use shiftcal_core::duplicates::find_duplicate_dates;
use shiftcal_core::store::{DateOutcome, ShiftStore, check_date_count, create_many};
use shiftcal_core::{NewShift, Shift, ShiftError, ShiftKind};

use crate::auth::AuthUser;
use crate::routes::{ApiJson, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shifts", get(list_shifts).post(create_shifts))
        .route("/api/shifts/duplicates", post(check_duplicates))
        .route("/api/shifts/{id}", delete(delete_shift))
}

/// Request body for creating one shift per date
#[derive(Deserialize)]
pub struct CreateShiftsRequest {
    pub dates: Vec<String>,
    pub kind: ShiftKind,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_overtime: bool,
}

/// Per-date results plus the dates that already had a shift
#[derive(Serialize)]
pub struct CreateShiftsResponse {
    pub duplicates: Vec<String>,
    pub results: Vec<DateOutcome>,
}

#[derive(Deserialize)]
pub struct DuplicatesRequest {
    pub dates: Vec<String>,
}

#[derive(Serialize)]
pub struct DuplicatesResponse {
    pub duplicates: Vec<String>,
}

/// GET /api/shifts - List the caller's shifts, ordered by date
async fn list_shifts(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<Shift>>, AppError> {
    let shifts = state.store.list(&principal).await?;
    Ok(Json(shifts))
}

/// POST /api/shifts - Create the same shift on each requested date
///
/// The shift itself and the date list are checked up front (400 on
/// failure). After that every date is created independently and reported
/// on its own.
async fn create_shifts(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(req): ApiJson<CreateShiftsRequest>,
) -> Result<Json<CreateShiftsResponse>, AppError> {
    let Some(first_date) = req.dates.first() else {
        return Err(ShiftError::Validation("Select at least one date".into()).into());
    };
    check_date_count(req.dates.len())?;

    // Every date gets the same hours, so one check covers them all
    let (default_start, default_end) = req.kind.default_times();
    let template = NewShift {
        date: first_date.clone(),
        kind: req.kind,
        start_time: req.start_time.unwrap_or_else(|| default_start.to_string()),
        end_time: req.end_time.unwrap_or_else(|| default_end.to_string()),
        is_overtime: req.is_overtime,
    }
    .validated()?;

    let duplicates = find_duplicate_dates(state.store.as_ref(), &principal, &req.dates).await?;
    if !duplicates.is_empty() {
        tracing::info!(user = %principal.user_id, ?duplicates, "creating shifts on dates that already have one");
    }

    let results = create_many(state.store.as_ref(), &principal, &template, &req.dates).await;

    Ok(Json(CreateShiftsResponse {
        duplicates,
        results,
    }))
}

/// POST /api/shifts/duplicates - Which of the given dates already have a shift
async fn check_duplicates(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(req): ApiJson<DuplicatesRequest>,
) -> Result<Json<DuplicatesResponse>, AppError> {
    let duplicates = find_duplicate_dates(state.store.as_ref(), &principal, &req.dates).await?;
    Ok(Json(DuplicatesResponse { duplicates }))
}

/// DELETE /api/shifts/:id - Delete one of the caller's shifts
async fn delete_shift(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&principal, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
