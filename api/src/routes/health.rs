//! Liveness endpoint.
//!
//! Reports that the gateway process is up. It does not contact the cluster.

use axum::{routing::get, Json, Router};
use serde::Serialize;

const SERVICE_NAME: &str = "pxgate-api";

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the process answers.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version of the running server.
    pub version: &'static str,
}

impl HealthResponse {
    const CURRENT: Self = Self {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    };
}

/// Creates the liveness route.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(|| async { Json(HealthResponse::CURRENT) }))
}
