//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality used across all integration tests,
//! including test app setup and HTTP request helpers.

use api::{create_router, AppState, Config};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use shared::client::replay::{ReplayConnector, ReplayFixture};
use std::sync::Arc;
use tempfile::TempDir;

/// Cluster configuration written for every test app.
pub const CLUSTER_CONFIG: &str =
    r#"{"px_api_key": "px-api-key", "px_cluster_id": "cluster-1", "cloud_addr": "localhost:443"}"#;

/// A router wired to a replay connector, with its files in a temporary directory.
pub struct TestApp {
    /// The configured router.
    pub router: Router,
    /// The connector behind the router, for inspecting session counts.
    pub connector: ReplayConnector,
    /// Directory holding `config.json` and the static files.
    pub dir: TempDir,
}

/// Creates a test app replaying `fixture` with default server settings.
pub fn test_app(fixture: ReplayFixture) -> TestApp {
    test_app_with(fixture, |_| {})
}

/// Creates a test app, letting the caller adjust the server configuration.
///
/// `config.json` holds [`CLUSTER_CONFIG`] and the static directory holds a
/// minimal `openapi.json`.
pub fn test_app_with(fixture: ReplayFixture, configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), CLUSTER_CONFIG).unwrap();
    std::fs::write(
        dir.path().join("openapi.json"),
        r#"{"openapi": "3.0.0", "paths": {"/pixie": {}}}"#,
    )
    .unwrap();

    let mut config = Config {
        cluster_config_path: dir.path().join("config.json"),
        static_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    configure(&mut config);

    let connector = ReplayConnector::new(fixture);
    let router = create_router(AppState::new(Arc::new(connector.clone()), config));

    TestApp {
        router,
        connector,
        dir,
    }
}

/// Helper to make a POST request with a raw body.
///
/// # Returns
///
/// A tuple containing the response status code and the body as text.
pub async fn post_raw(app: Router, uri: &str, body: String) -> (StatusCode, String) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8_lossy(&body_bytes).into_owned())
}

/// Helper to make a POST request with JSON body.
///
/// # Returns
///
/// A tuple containing the response status code and parsed JSON response body
/// (`Value::Null` for plain-text error bodies).
pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, text) = post_raw(app, uri, serde_json::to_string(&body).unwrap()).await;
    let json: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

    (status, json)
}

/// Helper to make a GET request.
///
/// # Returns
///
/// A tuple containing the response status code and parsed JSON response body.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}
