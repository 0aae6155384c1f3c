pub mod export;
pub mod shifts;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use shiftcal_core::ShiftError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(export::router())
        .merge(shifts::router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert errors to HTTP responses
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<ShiftError>() {
            Some(ShiftError::Auth(_)) => StatusCode::UNAUTHORIZED,
            Some(ShiftError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:#}", self.0);
        } else {
            tracing::debug!(%status, "request rejected: {}", self.0);
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// JSON request body that rejects as a 400 with the standard error payload
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ShiftError::Validation(rejection.body_text()).into()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_public() {
        let response = app(test_state())
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn token_rejected_by_backend_is_unauthorized() {
        use std::time::Duration;

        use axum::routing::get;
        use shiftcal_core::backend::BackendClient;
        use shiftcal_core::ics::IcsOptions;
        use shiftcal_core::identity::{Identity, RemoteIdentity};
        use shiftcal_core::store::{MemoryStore, Store};

        let backend = Router::new().route(
            "/auth/v1/user",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"msg": "invalid JWT"})),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, backend).await.unwrap();
        });

        let client =
            BackendClient::new(format!("http://{addr}"), "anon", Duration::from_secs(5)).unwrap();
        let state = crate::state::AppState::new(
            Store::Memory(MemoryStore::new()),
            Identity::Remote(RemoteIdentity::new(client)),
            IcsOptions::default(),
        );

        let response = app(state)
            .oneshot(request("GET", "/api/shifts", Some("expired-token"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("invalid JWT"), "{body}");
    }

    #[test]
    fn error_statuses() {
        let cases = [
            (ShiftError::Auth("x".into()), StatusCode::UNAUTHORIZED),
            (ShiftError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ShiftError::Format("x".into()), StatusCode::BAD_REQUEST),
            (ShiftError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ShiftError::Serialization("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ShiftError::Store("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::from(error).status(), status);
        }
    }
}
