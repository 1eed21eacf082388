//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - A fresh SQLite database per test in a temporary directory
//! - The full router, driven in-process through `tower::Service`
//! - Request helpers and seed data builders

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tik_api::app::{build_router, AppState};
use tik_api::config::{
    ApiConfig, Config, DatabaseConfig as ApiDatabaseConfig, JwtConfig, LoggingConfig,
    PasswordConfig,
};
use tik_shared::auth::password::PasswordHasher;
use tik_shared::db::migrations::run_migrations;
use tik_shared::db::pool::{create_pool, DatabaseConfig};
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Argon2 memory cost small enough to keep tests fast
pub const TEST_MEMORY_KIB: u32 = 1024;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: SqlitePool,
    pub app: axum::Router,
    pub config: Config,

    /// Keeps the database file alive for the duration of the test
    _dir: TempDir,
}

impl TestContext {
    /// Creates a new test context with a fresh, migrated database
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_debug(false).await
    }

    /// Same as `new`, with debug mode switched as requested
    pub async fn with_debug(debug: bool) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("tik.db").display());

        let db = create_pool(DatabaseConfig {
            url: url.clone(),
            max_connections: 5,
            ..Default::default()
        })
        .await?;

        run_migrations(&db).await?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                debug,
            },
            database: ApiDatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_SECRET.to_string(),
            },
            password: PasswordConfig {
                memory_kib: TEST_MEMORY_KIB,
            },
            logging: LoggingConfig { dir: None },
        };

        let hasher = PasswordHasher::new(TEST_MEMORY_KIB)?;
        let app = build_router(AppState::new(db.clone(), config.clone(), hasher));

        Ok(TestContext {
            db,
            app,
            config,
            _dir: dir,
        })
    }

    /// Sends a request with an optional JSON body
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Creates a label through the API and returns its ID
    pub async fn create_label(&self, resource: &str, label: &str) -> i64 {
        let response = self
            .post(&format!("/{}/", resource), json!({ "label": label }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()["id"].as_i64().unwrap()
    }

    /// Creates a user through the API and returns its ID
    pub async fn create_user(&self, username: &str) -> i64 {
        let response = self.post("/users/", user_body(username)).await;
        response.assert_status(StatusCode::CREATED);
        response.json()["id"].as_i64().unwrap()
    }

    pub async fn create_project(&self, creator_id: i64, label: &str) -> i64 {
        let response = self
            .post(
                "/projects/",
                json!({
                    "label": label,
                    "description": "Project description",
                    "creator_id": creator_id
                }),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()["id"].as_i64().unwrap()
    }

    /// Creates one user, project, ticket and the three labels it needs
    pub async fn seed_ticket(&self) -> Seed {
        let user_id = self.create_user("johndoe").await;
        let project_id = self.create_project(user_id, "Backend").await;
        let status_id = self.create_label("statuses", "Open").await;
        let category_id = self.create_label("categories", "Bug").await;
        let level_id = self.create_label("levels", "High").await;

        let response = self
            .post(
                "/tickets/",
                json!({
                    "title": "Login fails",
                    "description": "500 on submit",
                    "creator_id": user_id,
                    "project_id": project_id,
                    "status_id": status_id,
                    "category_id": category_id,
                    "level_id": level_id
                }),
            )
            .await;
        response.assert_status(StatusCode::CREATED);

        Seed {
            user_id,
            project_id,
            ticket_id: response.json()["id"].as_i64().unwrap(),
            status_id,
            category_id,
            level_id,
        }
    }

    pub async fn create_comment(&self, creator_id: i64, ticket_id: i64, content: &str) -> i64 {
        let response = self
            .post(
                "/comments/",
                json!({
                    "content": content,
                    "creator_id": creator_id,
                    "ticket_id": ticket_id
                }),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()["id"].as_i64().unwrap()
    }
}

/// IDs of the rows created by `TestContext::seed_ticket`
#[derive(Debug, Clone, Copy)]
pub struct Seed {
    pub user_id: i64,
    pub project_id: i64,
    pub ticket_id: i64,
    pub status_id: i64,
    pub category_id: i64,
    pub level_id: i64,
}

/// A fully buffered response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!("Response body is not JSON ({}): {}", e, self.text())
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Asserts the status, printing the body on mismatch
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            self.text()
        );
    }
}

/// A valid user creation body
pub fn user_body(username: &str) -> Value {
    json!({
        "first_name": "John",
        "last_name": "Doe",
        "username": username,
        "email": format!("{}@example.com", username),
        "role": "user",
        "password": "password123"
    })
}

/// Today as the store stamps it (SQLite `CURRENT_DATE` is UTC)
pub fn today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
