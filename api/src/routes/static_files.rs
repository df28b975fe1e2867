//! Static file routes.
//!
//! Serves the OpenAPI document and the landing page from the static directory.

use axum::Router;
use std::path::Path;
use tower_http::services::ServeFile;

/// Creates the static file routes rooted at `static_dir`.
pub fn static_routes(static_dir: &Path) -> Router {
    Router::new()
        .route_service("/openapi.json", ServeFile::new(static_dir.join("openapi.json")))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
}
