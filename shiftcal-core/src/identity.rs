//! Resolving bearer tokens to users.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use crate::backend::BackendClient;
use crate::error::{ShiftError, ShiftResult};
use crate::shift::UserId;

/// An authenticated caller: who they are and the token that proved it.
///
/// The token is forwarded to the backend so its access policy can scope
/// every query to the same user.
#[derive(Clone)]
pub struct Principal {
    pub user_id: UserId,
    pub access_token: String,
}

impl Principal {
    pub fn new(user_id: UserId, access_token: impl Into<String>) -> Self {
        Principal {
            user_id,
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> ShiftResult<&str> {
    let header = header.ok_or_else(|| ShiftError::Auth("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or_else(|| ShiftError::Auth("Authorization header is not a bearer token".into()))?;

    if token.is_empty() {
        return Err(ShiftError::Auth("Empty bearer token".into()));
    }
    Ok(token)
}

pub trait IdentityProvider: Send + Sync {
    /// Validate `token` and return the user it belongs to.
    fn authenticate(&self, token: &str) -> impl Future<Output = ShiftResult<Principal>> + Send;
}

/// Fixed token table, for local development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    tokens: HashMap<String, UserId>,
}

impl StaticIdentity {
    pub fn new(tokens: impl IntoIterator<Item = (String, UserId)>) -> Self {
        StaticIdentity {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    async fn authenticate(&self, token: &str) -> ShiftResult<Principal> {
        self.tokens
            .get(token)
            .map(|user| Principal::new(user.clone(), token))
            .ok_or_else(|| ShiftError::Auth("Invalid or expired token".into()))
    }
}

/// Validates tokens against the hosted backend's auth service.
#[derive(Debug, Clone)]
pub struct RemoteIdentity {
    client: BackendClient,
}

impl RemoteIdentity {
    pub fn new(client: BackendClient) -> Self {
        RemoteIdentity { client }
    }
}

impl IdentityProvider for RemoteIdentity {
    async fn authenticate(&self, token: &str) -> ShiftResult<Principal> {
        let user_id = self.client.get_user(token).await?;
        Ok(Principal::new(user_id, token))
    }
}

/// The identity provider selected by configuration.
#[derive(Debug, Clone)]
pub enum Identity {
    Static(StaticIdentity),
    Remote(RemoteIdentity),
}

impl IdentityProvider for Identity {
    async fn authenticate(&self, token: &str) -> ShiftResult<Principal> {
        match self {
            Identity::Static(identity) => identity.authenticate(token).await,
            Identity::Remote(identity) => identity.authenticate(token).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(matches!(bearer_token(None), Err(ShiftError::Auth(_))));
        assert!(matches!(bearer_token(Some("Basic abc")), Err(ShiftError::Auth(_))));
        assert!(matches!(bearer_token(Some("Bearer ")), Err(ShiftError::Auth(_))));
    }

    #[tokio::test]
    async fn static_identity_resolves_known_tokens() {
        let identity =
            StaticIdentity::new([("token-a".to_string(), UserId::new("user-a"))]);

        let principal = identity.authenticate("token-a").await.unwrap();
        assert_eq!(principal.user_id, UserId::new("user-a"));
        assert_eq!(principal.access_token, "token-a");

        assert!(matches!(
            identity.authenticate("nope").await,
            Err(ShiftError::Auth(_))
        ));
    }

    #[test]
    fn principal_debug_hides_token() {
        let principal = Principal::new(UserId::new("u"), "secret-token");
        assert!(!format!("{principal:?}").contains("secret-token"));
    }

    #[tokio::test]
    async fn remote_identity_checks_token_with_backend() {
        use axum::http::{HeaderMap, StatusCode};
        use axum::{Json, Router, routing::get};
        use serde_json::json;

        let router = Router::new().route(
            "/auth/v1/user",
            get(|headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .is_some_and(|v| v.as_bytes() == b"Bearer good-token");
                if authorized {
                    (StatusCode::OK, Json(json!({"id": "u-1", "email": "nurse@example.com"})))
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"msg": "invalid JWT"})))
                }
            }),
        );
        let identity =
            RemoteIdentity::new(crate::backend::test_support::serve(router).await);

        let principal = identity.authenticate("good-token").await.unwrap();
        assert_eq!(principal.user_id, UserId::new("u-1"));
        assert_eq!(principal.access_token, "good-token");

        match identity.authenticate("bad-token").await {
            Err(ShiftError::Auth(message)) => assert_eq!(message, "invalid JWT"),
            other => panic!("expected auth error, got {other:?}"),
        }
    }
}
