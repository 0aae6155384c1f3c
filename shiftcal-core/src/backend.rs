//! HTTP client for the hosted backend (REST tables + auth service).
//!
//! One `BackendClient` is built at startup from configuration and handed to
//! everything that talks to the backend. Cloning is cheap: the underlying
//! connection pool is shared.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::ShiftcalConfig;
use crate::error::{ShiftError, ShiftResult};
use crate::session::Session;
use crate::shift::UserId;

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Token grant response from the auth service
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
    // Sign-up without auto-confirm returns the bare user object
    id: Option<String>,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

/// Error body shapes used by the backend's REST and auth services
#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> ShiftResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(BackendClient {
            http,
            base_url,
            anon_key: anon_key.into(),
        })
    }

    pub fn from_config(config: &ShiftcalConfig) -> ShiftResult<Self> {
        let base_url = config
            .backend_url
            .as_deref()
            .ok_or_else(|| ShiftError::Config("backend_url is not set".into()))?;
        let anon_key = config
            .anon_key
            .as_deref()
            .ok_or_else(|| ShiftError::Config("anon_key is not set".into()))?;

        Self::new(base_url, anon_key, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Start a request carrying the project key and the caller's token.
    pub(crate) fn request(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    /// GET /auth/v1/user - resolve an access token to its user
    pub async fn get_user(&self, token: &str) -> ShiftResult<UserId> {
        let resp = self
            .request(Method::GET, &self.auth_url("user"), token)
            .send()
            .await?;
        let resp = auth_response(resp).await?;

        let user: AuthUser = resp.json().await?;
        Ok(UserId::new(user.id))
    }

    /// POST /auth/v1/token?grant_type=password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ShiftResult<Session> {
        let body = json!({ "email": email, "password": password });
        self.token_grant("password", &body)
            .await?
            .ok_or_else(|| ShiftError::Auth("Sign-in returned no session".into()))
    }

    /// POST /auth/v1/token?grant_type=refresh_token
    pub async fn refresh_session(&self, refresh_token: &str) -> ShiftResult<Session> {
        let body = json!({ "refresh_token": refresh_token });
        self.token_grant("refresh_token", &body)
            .await?
            .ok_or_else(|| ShiftError::Auth("Refresh returned no session".into()))
    }

    /// POST /auth/v1/signup
    ///
    /// Returns `None` when the account must be confirmed by email before a
    /// session is issued.
    pub async fn sign_up(&self, email: &str, password: &str) -> ShiftResult<Option<Session>> {
        let resp = self
            .request(Method::POST, &self.auth_url("signup"), &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let resp = auth_response(resp).await?;

        Ok(into_session(resp.json().await?))
    }

    /// POST /auth/v1/logout - revoke the session behind `token`
    pub async fn sign_out(&self, token: &str) -> ShiftResult<()> {
        let resp = self
            .request(Method::POST, &self.auth_url("logout"), token)
            .send()
            .await?;
        auth_response(resp).await?;
        Ok(())
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> ShiftResult<Option<Session>> {
        let resp = self
            .request(Method::POST, &self.auth_url("token"), &self.anon_key)
            .query(&[("grant_type", grant_type)])
            .json(body)
            .send()
            .await?;
        let resp = auth_response(resp).await?;

        Ok(into_session(resp.json().await?))
    }
}

fn into_session(token: TokenResponse) -> Option<Session> {
    let access_token = token.access_token?;
    let (user_id, email) = match token.user {
        Some(user) => (user.id, user.email),
        None => (token.id?, None),
    };

    let expires_at: Option<DateTime<Utc>> = token
        .expires_in
        .map(|secs| Utc::now() + chrono::Duration::seconds(secs));

    Some(Session {
        user_id: UserId::new(user_id),
        email,
        access_token,
        refresh_token: token.refresh_token,
        expires_at,
    })
}

/// Map auth-service failures: every 4xx is a credential problem.
async fn auth_response(resp: Response) -> ShiftResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = error_message(resp).await;
    if status.is_client_error() {
        Err(ShiftError::Auth(message))
    } else {
        Err(ShiftError::Store(format!("Auth service returned {status}: {message}")))
    }
}

/// Map REST failures: 401/403 are credential problems, the rest are store errors.
pub(crate) async fn rest_response(resp: Response) -> ShiftResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = error_message(resp).await;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ShiftError::Auth(message)),
        _ => Err(ShiftError::Store(format!("Backend returned {status}: {message}"))),
    }
}

async fn error_message(resp: Response) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    body.error_description
        .or(body.msg)
        .or(body.message)
        .or(body.error)
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        })
}

/// Local stand-in for the hosted backend.
#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use axum::Router;

    use super::BackendClient;

    pub const ANON_KEY: &str = "anon-key";

    /// Serve `router` on an ephemeral local port and point a client at it.
    pub async fn serve(router: Router) -> BackendClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        BackendClient::new(format!("http://{addr}"), ANON_KEY, Duration::from_secs(5)).unwrap()
    }
}
