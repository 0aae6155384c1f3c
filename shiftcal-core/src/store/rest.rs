//! Shift store backed by the hosted backend's REST interface.
//!
//! Talks to the `shifts` table with PostgREST-style filters
//! (`user_id=eq.<id>`, `date=in.(...)`, `order=date.asc`).

use std::collections::BTreeSet;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::backend::{BackendClient, rest_response};
use crate::error::{ShiftError, ShiftResult};
use crate::identity::Principal;
use crate::shift::{NewShift, Shift, ShiftKind, UserId};
use crate::store::ShiftStore;
use crate::time::normalize_time_column;

const TABLE: &str = "shifts";

#[derive(Debug, Clone)]
pub struct RestStore {
    client: BackendClient,
}

/// Row body for inserts
#[derive(Serialize)]
struct InsertRow<'a> {
    user_id: &'a UserId,
    date: &'a str,
    #[serde(rename = "type")]
    kind: ShiftKind,
    start_time: &'a str,
    end_time: &'a str,
    is_overtime: bool,
}

#[derive(Deserialize)]
struct DateRow {
    date: String,
}

impl RestStore {
    pub fn new(client: BackendClient) -> Self {
        RestStore { client }
    }

    fn url(&self) -> String {
        self.client.rest_url(TABLE)
    }
}

/// Time columns come back as `HH:MM:SS`
fn normalize(mut shift: Shift) -> Shift {
    shift.start_time = normalize_time_column(&shift.start_time);
    shift.end_time = normalize_time_column(&shift.end_time);
    shift
}

/// `in.(a,b,c)` filter value
fn in_filter(values: &[String]) -> String {
    format!("in.({})", values.join(","))
}

impl ShiftStore for RestStore {
    async fn create(&self, principal: &Principal, shift: NewShift) -> ShiftResult<Shift> {
        let shift = shift.validated()?;
        let row = InsertRow {
            user_id: &principal.user_id,
            date: &shift.date,
            kind: shift.kind,
            start_time: &shift.start_time,
            end_time: &shift.end_time,
            is_overtime: shift.is_overtime,
        };

        let resp = self
            .client
            .request(Method::POST, &self.url(), &principal.access_token)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;
        let resp = rest_response(resp).await?;

        let mut rows: Vec<Shift> = resp.json().await?;
        let created = rows
            .pop()
            .ok_or_else(|| ShiftError::Store("Insert returned no row".into()))?;

        tracing::debug!(id = %created.id, date = %created.date, "shift created");
        Ok(normalize(created))
    }

    async fn list(&self, principal: &Principal) -> ShiftResult<Vec<Shift>> {
        let owner = format!("eq.{}", principal.user_id);
        let resp = self
            .client
            .request(Method::GET, &self.url(), &principal.access_token)
            .query(&[
                ("select", "*"),
                ("user_id", owner.as_str()),
                ("order", "date.asc,start_time.asc"),
            ])
            .send()
            .await?;
        let resp = rest_response(resp).await?;

        let rows: Vec<Shift> = resp.json().await?;
        Ok(rows.into_iter().map(normalize).collect())
    }

    async fn delete(&self, principal: &Principal, id: &str) -> ShiftResult<()> {
        let id_filter = format!("eq.{id}");
        let owner = format!("eq.{}", principal.user_id);
        let resp = self
            .client
            .request(Method::DELETE, &self.url(), &principal.access_token)
            .query(&[("id", id_filter.as_str()), ("user_id", owner.as_str())])
            .send()
            .await?;
        rest_response(resp).await?;

        tracing::debug!(%id, "shift deleted");
        Ok(())
    }

    async fn dates_with_shifts(
        &self,
        principal: &Principal,
        dates: &[String],
    ) -> ShiftResult<BTreeSet<String>> {
        if dates.is_empty() {
            return Ok(BTreeSet::new());
        }

        let owner = format!("eq.{}", principal.user_id);
        let date_filter = in_filter(dates);
        let resp = self
            .client
            .request(Method::GET, &self.url(), &principal.access_token)
            .query(&[
                ("select", "date"),
                ("user_id", owner.as_str()),
                ("date", date_filter.as_str()),
            ])
            .send()
            .await?;
        let resp = rest_response(resp).await?;

        let rows: Vec<DateRow> = resp.json().await?;
        Ok(rows.into_iter().map(|row| row.date).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode as Status};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use chrono::Utc;
    use serde_json::{Value, json};

    use crate::backend::test_support::{self, ANON_KEY};

    type Captured<T> = Arc<Mutex<Option<T>>>;

    fn alice() -> Principal {
        Principal::new(UserId::new("alice"), "token-alice")
    }

    fn night_row(id: Value) -> Value {
        json!({
            "id": id,
            "user_id": "alice",
            "date": "2025-01-02",
            "type": "night",
            "start_time": "19:00:00",
            "end_time": "07:00:00",
            "is_overtime": false,
            "created_at": "2025-01-01T10:00:00+00:00"
        })
    }

    async fn store_for(router: Router) -> RestStore {
        RestStore::new(test_support::serve(router).await)
    }

    #[test]
    fn in_filter_lists_dates() {
        let dates = vec!["2025-01-01".to_string(), "2025-01-03".to_string()];
        assert_eq!(in_filter(&dates), "in.(2025-01-01,2025-01-03)");
    }

    #[test]
    fn insert_row_uses_table_column_names() {
        let user = UserId::new("u-1");
        let row = InsertRow {
            user_id: &user,
            date: "2025-01-02",
            kind: ShiftKind::EightHour,
            start_time: "07:00",
            end_time: "15:00",
            is_overtime: true,
        };

        let value = serde_json::to_value([row]).unwrap();
        assert_eq!(value[0]["user_id"], "u-1");
        assert_eq!(value[0]["type"], "8hour");
        assert_eq!(value[0]["is_overtime"], true);
    }

    #[test]
    fn normalize_trims_seconds_from_time_columns() {
        let shift = Shift {
            id: "1".into(),
            owner: UserId::new("u-1"),
            date: "2025-01-02".into(),
            kind: ShiftKind::Night,
            start_time: "19:00:00".into(),
            end_time: "07:00:00".into(),
            is_overtime: false,
            created_at: Utc::now(),
        };

        let shift = normalize(shift);
        assert_eq!(shift.start_time, "19:00");
        assert_eq!(shift.end_time, "07:00");
    }

    #[tokio::test]
    async fn list_filters_by_owner_and_orders_by_date() {
        let captured: Captured<(HashMap<String, String>, HeaderMap)> = Arc::default();
        let log = captured.clone();
        let router = Router::new().route(
            "/rest/v1/shifts",
            get(
                move |Query(query): Query<HashMap<String, String>>, headers: HeaderMap| {
                    let log = log.clone();
                    async move {
                        *log.lock().unwrap() = Some((query, headers));
                        Json(json!([night_row(json!(7))]))
                    }
                },
            ),
        );
        let store = store_for(router).await;

        let shifts = store.list(&alice()).await.unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].id, "7");
        assert_eq!(shifts[0].start_time, "19:00");
        assert_eq!(shifts[0].end_time, "07:00");

        let (query, headers) = captured.lock().unwrap().take().unwrap();
        assert_eq!(query["select"], "*");
        assert_eq!(query["user_id"], "eq.alice");
        assert_eq!(query["order"], "date.asc,start_time.asc");
        assert_eq!(headers["apikey"], ANON_KEY);
        assert_eq!(headers["authorization"], "Bearer token-alice");
    }

    #[tokio::test]
    async fn create_posts_row_and_asks_for_representation() {
        let captured: Captured<(HeaderMap, Value)> = Arc::default();
        let log = captured.clone();
        let router = Router::new().route(
            "/rest/v1/shifts",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let log = log.clone();
                async move {
                    *log.lock().unwrap() = Some((headers, body));
                    (Status::CREATED, Json(json!([night_row(json!("s-1"))])))
                }
            }),
        );
        let store = store_for(router).await;

        let created = store
            .create(&alice(), NewShift::with_default_times("2025-01-02", ShiftKind::Night))
            .await
            .unwrap();
        assert_eq!(created.id, "s-1");
        assert_eq!(created.start_time, "19:00");

        let (headers, body) = captured.lock().unwrap().take().unwrap();
        assert_eq!(headers["prefer"], "return=representation");
        assert_eq!(body[0]["user_id"], "alice");
        assert_eq!(body[0]["type"], "night");
    }

    #[tokio::test]
    async fn empty_insert_representation_is_store_error() {
        let router = Router::new().route(
            "/rest/v1/shifts",
            post(|| async { (Status::CREATED, Json(json!([]))) }),
        );
        let store = store_for(router).await;

        let err = store
            .create(&alice(), NewShift::with_default_times("2025-01-02", ShiftKind::Day))
            .await
            .unwrap_err();
        match err {
            ShiftError::Store(message) => assert!(message.contains("no row"), "{message}"),
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_shift_never_reaches_backend() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = Router::new().route(
            "/rest/v1/shifts",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { (Status::CREATED, Json(json!([]))) }
            }),
        );
        let store = store_for(router).await;

        let mut shift = NewShift::with_default_times("2025-01-02", ShiftKind::Day);
        shift.end_time = shift.start_time.clone();
        let err = store.create(&alice(), shift).await.unwrap_err();
        assert!(matches!(err, ShiftError::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_token_is_auth_error() {
        for status in [Status::UNAUTHORIZED, Status::FORBIDDEN] {
            let router = Router::new().route(
                "/rest/v1/shifts",
                get(move || async move { (status, Json(json!({"message": "JWT expired"}))) }),
            );
            let store = store_for(router).await;

            match store.list(&alice()).await {
                Err(ShiftError::Auth(message)) => assert_eq!(message, "JWT expired"),
                other => panic!("{status}: expected auth error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn server_error_is_store_error() {
        let router = Router::new().route(
            "/rest/v1/shifts",
            axum::routing::delete(|| async {
                (Status::INTERNAL_SERVER_ERROR, Json(json!({"message": "relation does not exist"})))
            }),
        );
        let store = store_for(router).await;

        match store.delete(&alice(), "s-1").await {
            Err(ShiftError::Store(message)) => {
                assert!(message.contains("relation does not exist"), "{message}")
            }
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dates_with_shifts_uses_in_filter() {
        let captured: Captured<HashMap<String, String>> = Arc::default();
        let log = captured.clone();
        let router = Router::new().route(
            "/rest/v1/shifts",
            get(move |Query(query): Query<HashMap<String, String>>| {
                let log = log.clone();
                async move {
                    *log.lock().unwrap() = Some(query);
                    Json(json!([{"date": "2025-01-01"}]))
                }
            }),
        );
        let store = store_for(router).await;

        let dates = vec!["2025-01-01".to_string(), "2025-01-03".to_string()];
        let found = store.dates_with_shifts(&alice(), &dates).await.unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["2025-01-01"]);

        let query = captured.lock().unwrap().take().unwrap();
        assert_eq!(query["select"], "date");
        assert_eq!(query["user_id"], "eq.alice");
        assert_eq!(query["date"], "in.(2025-01-01,2025-01-03)");
    }
}
