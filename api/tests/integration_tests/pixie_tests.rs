//! Integration tests for script execution.
//!
//! Tests cover:
//! - Column derivation and row accumulation through the full router
//! - Request validation and the default script fallback
//! - Cluster configuration errors
//! - Remote failure classification and timeouts

use axum::http::StatusCode;
use serde_json::json;
use shared::client::replay::{FailureStage, ReplayFixture};
use shared::client::ErrorKind;
use shared::models::{DataType, Datum, FieldDescriptor, SchemaAttribute, TableMetadata};
use std::time::Duration;

use super::common::{post_json, post_raw, test_app, test_app_with};

fn http_events_fixture() -> ReplayFixture {
    ReplayFixture {
        api_key: Some("px-api-key".to_string()),
        clusters: vec!["cluster-1".to_string()],
        ..ReplayFixture::default()
    }
    .with_table(
        TableMetadata::new("http_events", "0")
            .with_names(SchemaAttribute::Columns, ["upid", "req_path"]),
        vec![
            vec![Datum::from("12345"), Datum::from("/api/users")],
            vec![Datum::from("67890"), Datum::from("/login")],
        ],
    )
}

#[tokio::test]
async fn test_script_results_are_flattened() {
    let app = test_app(http_events_fixture());

    let (status, response) = post_json(
        app.router,
        "/pixie",
        json!({"script": "import px\npx.display(px.DataFrame('http_events'))"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["columns"], json!(["upid", "req_path"]));
    assert_eq!(
        response["rows"],
        json!([["12345", "/api/users"], ["67890", "/login"]])
    );
    assert_eq!(response["stats"]["records_processed"], 2);
    assert_eq!(app.connector.sessions_opened(), 1);
}

#[tokio::test]
async fn test_descriptor_metadata_and_typed_cells() {
    let fixture = ReplayFixture::default().with_table(
        TableMetadata::new("conn_stats", "0").with_descriptors(
            SchemaAttribute::Fields,
            vec![
                FieldDescriptor::new("time_", DataType::Time64ns),
                FieldDescriptor::new("conn_open", DataType::Int64),
                FieldDescriptor::new("encrypted", DataType::Boolean),
            ],
        ),
        vec![vec![
            Datum::Time64ns(1_000_000_000),
            Datum::Int64(3),
            Datum::Boolean(false),
        ]],
    );
    let app = test_app(fixture);

    let (status, response) = post_json(app.router, "/pixie", json!({"script": "s"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["columns"], json!(["time_", "conn_open", "encrypted"]));
    assert_eq!(
        response["rows"],
        json!([["1970-01-01T00:00:01.000000000Z", "3", "false"]])
    );
}

#[tokio::test]
async fn test_unrecognized_metadata_keeps_rows() {
    let fixture = ReplayFixture::default().with_table(
        TableMetadata::new("opaque", "0"),
        vec![vec![Datum::from("a")], vec![Datum::from("b"), Datum::from("c")]],
    );
    let app = test_app(fixture);

    let (status, response) = post_json(app.router, "/pixie", json!({"script": "s"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["columns"], json!([]));
    assert_eq!(response["rows"], json!([["a"], ["b", "c"]]));
}

#[tokio::test]
async fn test_multiple_tables_share_one_result() {
    let fixture = http_events_fixture().with_table(
        TableMetadata::new("other", "1").with_names(SchemaAttribute::Columns, ["ignored"]),
        vec![vec![Datum::from("99999"), Datum::from("/health")]],
    );
    let app = test_app(fixture);

    let (status, response) = post_json(app.router, "/pixie", json!({"script": "s"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["columns"], json!(["upid", "req_path"]));
    assert_eq!(response["rows"].as_array().unwrap().len(), 3);
    assert_eq!(response["rows"][2], json!(["99999", "/health"]));
}

#[tokio::test]
async fn test_fixed_stats_pass_through() {
    let stats = json!({"Timing": {"ExecutionTimeNs": 1200, "CompilationTimeNs": 300}});
    let fixture = ReplayFixture {
        stats: Some(stats.clone()),
        ..http_events_fixture()
    };
    let app = test_app(fixture);

    let (status, response) = post_json(app.router, "/pixie", json!({"script": "s"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["stats"], stats);
}

#[tokio::test]
async fn test_empty_script_is_bad_request() {
    let app = test_app(http_events_fixture());

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "  "}"#.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Invalid request"));
    assert_eq!(app.connector.sessions_opened(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app(http_events_fixture());

    let (status, _) = post_raw(app.router, "/pixie", "script=px".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.connector.sessions_opened(), 0);
}

#[tokio::test]
async fn test_default_script_is_used_when_absent() {
    let app = test_app_with(http_events_fixture(), |config| {
        config.default_script = Some(config.static_dir.join("conn_status.pxl"));
    });
    std::fs::write(
        app.dir.path().join("conn_status.pxl"),
        "import px\npx.display(px.DataFrame('conn_stats'))",
    )
    .unwrap();

    let (status, response) = post_json(app.router, "/pixie", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["columns"], json!(["upid", "req_path"]));
}

#[tokio::test]
async fn test_missing_cluster_config_field_is_server_error() {
    let app = test_app(http_events_fixture());
    std::fs::write(
        app.dir.path().join("config.json"),
        r#"{"px_api_key": "px-api-key", "px_cluster_id": "", "cloud_addr": "localhost:443"}"#,
    )
    .unwrap();

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("PX_CLUSTER_ID is not set in config file"));
    assert_eq!(app.connector.sessions_opened(), 0);
}

#[tokio::test]
async fn test_malformed_cloud_addr_is_server_error() {
    let app = test_app(http_events_fixture());
    std::fs::write(
        app.dir.path().join("config.json"),
        r#"{"px_api_key": "px-api-key", "px_cluster_id": "cluster-1", "cloud_addr": "localhost"}"#,
    )
    .unwrap();

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("host:port"));
    assert_eq!(app.connector.sessions_opened(), 0);
}

#[tokio::test]
async fn test_missing_cluster_config_file_is_server_error() {
    let app = test_app(http_events_fixture());
    std::fs::remove_file(app.dir.path().join("config.json")).unwrap();

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Failed to load configuration"));
}

#[tokio::test]
async fn test_wrong_api_key_is_unauthorized() {
    let fixture = ReplayFixture {
        api_key: Some("another-key".to_string()),
        ..http_events_fixture()
    };
    let app = test_app(fixture);

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Authentication failed: Invalid API key");
}

#[tokio::test]
async fn test_unauthenticated_execution_error_is_unauthorized() {
    let fixture = http_events_fixture().with_failure(
        FailureStage::Stream,
        ErrorKind::Unclassified,
        "rpc error: code = Unauthenticated desc = unauthenticated",
    );
    let app = test_app(fixture);

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        "Authentication failed: Invalid or expired token"
    );
}

#[tokio::test]
async fn test_unknown_cluster_is_not_found() {
    let fixture = ReplayFixture {
        clusters: vec!["some-other-cluster".to_string()],
        ..http_events_fixture()
    };
    let app = test_app(fixture);

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Cluster not found: cluster-1");
}

#[tokio::test]
async fn test_typed_kind_wins_over_message_text() {
    let fixture = http_events_fixture().with_failure(
        FailureStage::Session,
        ErrorKind::NotFound,
        "unauthenticated lookup failed",
    );
    let app = test_app(fixture);

    let (status, _) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_compilation_error_is_bad_request() {
    let fixture = http_events_fixture().with_failure(
        FailureStage::Execute,
        ErrorKind::Compilation,
        "Compilation error: name 'dx' is not defined",
    );
    let app = test_app(fixture);

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("PxL compilation error"));
}

#[tokio::test]
async fn test_untyped_compilation_error_naming_missing_table_is_bad_request() {
    let fixture = http_events_fixture().with_failure(
        FailureStage::Execute,
        ErrorKind::Unclassified,
        "Compilation error: Table 'http_event' not found",
    );
    let app = test_app(fixture);

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        "PxL compilation error: Compilation error: Table 'http_event' not found"
    );
}

#[tokio::test]
async fn test_mid_stream_failure_returns_no_rows() {
    let fixture = http_events_fixture().with_failure(
        FailureStage::Stream,
        ErrorKind::Internal,
        "stream reset by peer",
    );
    let app = test_app(fixture);

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Failed executing script: stream reset by peer");
    assert!(!body.contains("12345"));
}

#[tokio::test]
async fn test_session_timeout_is_gateway_timeout() {
    let fixture = ReplayFixture {
        session_delay_ms: 5_000,
        ..http_events_fixture()
    };
    let app = test_app_with(fixture, |config| {
        config.session_timeout = Duration::from_millis(50);
    });

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, "Timeout connecting to cluster");
    assert!(!body.contains("12345"));
    assert_eq!(app.connector.sessions_opened(), 0);
}

#[tokio::test]
async fn test_execution_timeout_is_gateway_timeout() {
    let fixture = ReplayFixture {
        execution_delay_ms: 5_000,
        ..http_events_fixture()
    };
    let app = test_app_with(fixture, |config| {
        config.execution_timeout = Duration::from_millis(50);
    });

    let (status, body) = post_raw(app.router, "/pixie", r#"{"script": "s"}"#.to_string()).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, "Timeout executing script");
    assert_eq!(app.connector.sessions_opened(), 1);
}

#[tokio::test]
async fn test_bundled_replay_fixture() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures/conn_status.json");
    let fixture = ReplayFixture::from_file(path).unwrap();
    let app = test_app(fixture);

    let (status, response) = post_json(app.router, "/pixie", json!({"script": "s"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response["columns"],
        json!(["pod", "remote_addr", "conn_open", "bytes_sent", "upid"])
    );
    assert_eq!(
        response["rows"][0],
        json!([
            "pl/vizier-query-broker-7c8d9f",
            "10.0.0.12",
            "4",
            "18231",
            "01000000-0000-0000-0000-000000000001"
        ])
    );
}
