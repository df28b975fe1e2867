//! pxgate API Server
//!
//! This crate provides the HTTP gateway that runs PxL scripts on a remote
//! cluster and returns the streamed tables as JSON.
//!
//! # Architecture
//!
//! The API server is built on Axum and Tokio, providing:
//! - `POST /pixie` to execute a script and return `{columns, rows, stats}`
//! - `GET /openapi.json` and `GET /` served from the static directory
//! - `GET /health` for load balancers
//!
//! The query service is reached through the [`shared::client::Connector`]
//! trait. [`run_server_with_connector`] accepts any binding;
//! [`run_server_with_config`] serves a replay fixture.
//!
//! # Example
//!
//! ```no_run
//! use api::{run_server_with_config, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server_with_config(Config::from_env()?).await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod routes;
mod state;

pub use config::{Config, LogFormat};
pub use error::{GatewayError, Stage};
pub use routes::{PixieRequest, PixieResponse};
pub use state::AppState;

use anyhow::{Context, Result};
use axum::Router;
use shared::client::replay::{ReplayConnector, ReplayFixture};
use shared::client::Connector;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Runs the pxgate API server with the provided configuration.
///
/// The query service is replayed from `config.replay_file`.
///
/// # Errors
///
/// Returns an error if:
/// - No replay fixture is configured or it cannot be loaded
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    let Some(replay_file) = config.replay_file.clone() else {
        anyhow::bail!(
            "No query-service binding available; set PXGATE_REPLAY_FILE to serve recorded results"
        );
    };

    let fixture = ReplayFixture::from_file(&replay_file)
        .with_context(|| format!("Failed to load replay fixture {}", replay_file.display()))?;

    tracing::info!(
        replay_file = %replay_file.display(),
        tables = fixture.tables.len(),
        "Serving recorded results"
    );

    run_server_with_connector(config, Arc::new(ReplayConnector::new(fixture))).await
}

/// Runs the pxgate API server with the provided configuration and connector.
///
/// This is the entry point for a live query-service binding.
///
/// # Errors
///
/// Returns an error if:
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_connector(
    config: Config,
    connector: Arc<dyn Connector>,
) -> Result<()> {
    let addr = config.socket_addr();

    tracing::info!(
        host = %config.host,
        port = %config.port,
        cluster_config = %config.cluster_config_path.display(),
        static_dir = %config.static_dir.display(),
        "pxgate API server starting"
    );

    let app = create_router(AppState::new(connector, config));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Listening for connections");
    tracing::info!("OpenAPI specification available at http://{addr}/openapi.json");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config().static_dir.clone();

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::pixie_routes(state))
        .merge(routes::static_routes(&static_dir))
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
