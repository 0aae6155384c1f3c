//! Bearer-token authentication for API routes.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use shiftcal_core::identity::{IdentityProvider, Principal, bearer_token};

use crate::routes::AppError;
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer <token>` header.
///
/// Rejects with 401 and an error payload when the header is missing,
/// malformed, or the token is not accepted by the identity provider.
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let token = bearer_token(header)?;
        let principal = state.identity.authenticate(token).await?;

        Ok(Self(principal))
    }
}
