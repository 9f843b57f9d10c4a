//! Test utilities for the API integration tests
//!
//! Every test gets its own SQLite file in a temporary directory and a
//! manual clock, so token expiry can be driven without sleeping.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use backend_lib::{
    auth::ManualClock, config::Settings, create_router, storage::SqliteStorage, AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_SECRET: &str = "let-me-in";
pub const START: i64 = 1_700_000_000;

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub settings: Settings,
    // Keep in scope so the database outlives the test body
    _dir: TempDir,
}

pub fn test_settings(dir: &TempDir) -> Settings {
    Settings {
        database_path: dir.path().join("linkshelf.db"),
        jwt_secret: "integration-test-secret".to_string(),
        admin_secret: ADMIN_SECRET.to_string(),
        posts_per_page: 2,
        ..Settings::default()
    }
}

/// Sets up a fresh application backed by a temporary database
pub fn setup_test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);
    settings.validate().unwrap();

    let clock = Arc::new(ManualClock::new(START));
    let storage = Arc::new(SqliteStorage::open(&settings.database_path).unwrap());
    let state = Arc::new(AppState::with_clock(storage, settings.clone(), clock.clone()));

    TestApp {
        router: create_router(state),
        clock,
        settings,
        _dir: dir,
    }
}

impl TestApp {
    /// Send a request and decode the JSON response
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            },
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({
                "username": username,
                "email": email,
                "password": password,
                "secret": ADMIN_SECRET,
            })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register then log in, returning the access token
    pub async fn signed_in(&self, username: &str, email: &str) -> String {
        let (status, _) = self.register(username, email, "Sup3rSecret!").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(email, "Sup3rSecret!").await;
        assert_eq!(status, StatusCode::OK);
        body["accessToken"].as_str().unwrap().to_string()
    }

    pub async fn create_post(&self, token: &str, link: &str, tags: &[&str]) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/posts",
            Some(token),
            Some(json!({
                "title": format!("Post about {link}"),
                "description": "worth reading",
                "link": link,
                "image": "https://img.example.com/cover.png",
                "tags": tags,
            })),
        )
        .await
    }
}

pub fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap()
}
