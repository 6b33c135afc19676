#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory store whose call counter shows whether a handler ran
/// - A fixed test configuration
/// - JWT token generation
/// - Request helpers that drive the router without a socket

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tabkeeper_api::app::{build_router, AppState};
use tabkeeper_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use tabkeeper_shared::auth::jwt::{create_token, Claims};
use tabkeeper_shared::store::{memory::MemoryStore, Store};
use tower::ServiceExt as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing all necessary resources
pub struct TestContext<S = MemoryStore> {
    pub store: S,
    pub app: Router,
    pub config: Config,
    pub jwt_token: String,
}

/// Status and parsed JSON body of a response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://localhost/tabkeeper_test".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
    }
}

impl TestContext {
    /// Creates a new test context with an empty store
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl<S: Store> TestContext<S> {
    /// Creates a test context over any store backend
    pub fn with_store(store: S) -> Self {
        let config = test_config();

        let jwt_token = create_token(&Claims::new(1), &config.jwt.secret).unwrap();

        let state = AppState::new(store.clone(), config.clone());
        let app = build_router(state);

        TestContext {
            store,
            app,
            config,
            jwt_token,
        }
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Sends a request with an optional `Authorization` value and JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    /// Authenticated GET
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(&self.auth_header()), None).await
    }

    /// Authenticated POST with a JSON body
    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(&self.auth_header()), Some(body))
            .await
    }

    /// Authenticated PUT with a JSON body
    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(&self.auth_header()), Some(body))
            .await
    }

    /// Authenticated DELETE
    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(&self.auth_header()), None)
            .await
    }

    /// Creates a record and returns its JSON, failing the test on any error
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let response = self.post(uri, body).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "create {} failed: {}",
            uri,
            response.body
        );
        response.body
    }
}
