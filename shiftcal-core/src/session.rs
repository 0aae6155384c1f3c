//! Current credentials and change notifications.
//!
//! `AuthState` holds the signed-in session, if any. Interested parties call
//! [`AuthState::subscribe`] and get their handler invoked with the new
//! session (or `None` after sign-out) on every change. The returned
//! [`Subscription`] unsubscribes when dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Principal;
use crate::shift::UserId;

/// A signed-in user's credentials.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.user_id.clone(), self.access_token.clone())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

type Handler = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

#[derive(Default)]
struct Inner {
    current: Option<Session>,
    next_id: u64,
    handlers: BTreeMap<u64, Handler>,
}

/// Shared auth state. Clones observe the same session.
#[derive(Clone, Default)]
pub struct AuthState {
    inner: Arc<Mutex<Inner>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a session already in place, without notifying anyone.
    pub fn with_session(session: Option<Session>) -> Self {
        let state = Self::new();
        state.lock().current = session;
        state
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Option<Session> {
        self.lock().current.clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.lock().current.as_ref().map(|s| s.user_id.clone())
    }

    /// True when a session is present and not past its expiry.
    pub fn is_authenticated(&self) -> bool {
        self.lock()
            .current
            .as_ref()
            .is_some_and(|session| !session.is_expired())
    }

    /// Replace the session and notify every subscriber.
    pub fn set_session(&self, session: Option<Session>) {
        // Handlers run outside the lock so they may read the state
        let handlers: Vec<Handler> = {
            let mut inner = self.lock();
            inner.current = session.clone();
            inner.handlers.values().cloned().collect()
        };

        tracing::debug!(
            user = ?session.as_ref().map(|s| &s.user_id),
            subscribers = handlers.len(),
            "auth state changed"
        );

        for handler in handlers {
            handler(session.as_ref());
        }
    }

    /// Register `handler` for credential changes.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.insert(id, Arc::new(handler));

        Subscription {
            id,
            state: Arc::downgrade(&self.inner),
        }
    }

    fn subscriber_count(&self) -> usize {
        self.lock().handlers.len()
    }
}

/// Handle for a registered handler. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.state.upgrade() {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handlers
                .remove(&self.id);
        }
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("user_id", &self.user_id())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
