use scheduling_backend::{
    api::router::create_router,
    config::Config,
    infra::factory::{connect_sqlite, sqlite_state},
    state::AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "password123";

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_secret: "integration-test-secret".to_string(),
            jwt_ttl_hours: 1,
            auth_issuer: "test-issuer".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
        };

        let pool = connect_sqlite(&db_url).await.expect("Failed to open test db");
        let state = Arc::new(sqlite_state(pool.clone(), &config));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Signs up a fresh account and returns its bearer token.
    pub async fn signup(&self, email: &str) -> String {
        let response = self.request(Method::POST, "/api/auth/signup", None, Some(json!({
            "email": email,
            "username": email.split('@').next().unwrap(),
            "password": PASSWORD,
        }))).await;

        if response.status() != StatusCode::OK {
            panic!("Signup failed in test helper: status {}", response.status());
        }
        let body = parse_body(response).await;
        body["token"].as_str().expect("No token in signup response").to_string()
    }

    /// Creates an event type (seeded with Mon-Fri 09:00-17:00 UTC) and returns its JSON.
    pub async fn create_event_type(&self, token: &str, slug: &str, duration: i32) -> Value {
        let response = self.request(Method::POST, "/api/event-types", Some(token), Some(json!({
            "title": format!("{} minute meeting", duration),
            "slug": slug,
            "duration": duration,
        }))).await;

        assert_eq!(response.status(), StatusCode::CREATED, "event type creation failed");
        parse_body(response).await["data"].clone()
    }

    pub async fn book(&self, event_type_id: &str, start: &str, end: Option<&str>) -> Response {
        let mut payload = json!({
            "eventTypeId": event_type_id,
            "guestName": "Grace Guest",
            "guestEmail": "grace@example.com",
            "startTime": start,
        });
        if let Some(end) = end {
            payload["endTime"] = json!(end);
        }
        self.request(Method::POST, "/api/bookings", None, Some(payload)).await
    }

    pub async fn slots(&self, slug: &str, date: NaiveDate) -> Vec<Value> {
        let response = self.request(
            Method::GET,
            &format!("/api/public/{}/availability?date={}", slug, date),
            None,
            None,
        ).await;
        assert_eq!(response.status(), StatusCode::OK);
        parse_body(response).await["slots"].as_array().cloned().unwrap_or_default()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The Monday at least a week ahead, so bookings on it are always in the future.
#[allow(dead_code)]
pub fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(7);
    while date.weekday() != Weekday::Mon {
        date += Duration::days(1);
    }
    date
}

#[allow(dead_code)]
pub fn at(date: NaiveDate, hh_mm: &str) -> String {
    format!("{}T{}:00Z", date, hh_mm)
}

#[allow(dead_code)]
pub fn slot_times(slots: &[Value]) -> Vec<String> {
    slots.iter().map(|s| s["time"].as_str().unwrap().to_string()).collect()
}
