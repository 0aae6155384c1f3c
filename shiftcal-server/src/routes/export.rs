//! Calendar export endpoint

use axum::{
    Router,
    extract::State,
    http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
};
use shiftcal_core::export::{EXPORT_FILENAME, export_calendar};

use crate::auth::AuthUser;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/generate-ical", get(generate_ical))
}

/// GET /api/generate-ical - Download all of the caller's shifts as .ics
async fn generate_ical(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let ics = export_calendar(state.store.as_ref(), &principal, &state.ics).await?;

    Ok((
        [
            (CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
            (CACHE_CONTROL, "no-cache".to_string()),
        ],
        ics,
    ))
}
