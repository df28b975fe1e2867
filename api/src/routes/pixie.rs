//! Script execution endpoint.
//!
//! Runs a PxL script on the configured cluster and returns the streamed tables
//! as flat JSON.

use crate::error::{GatewayError, Stage};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::config::ClusterConfig;
use shared::results::{AccumulatedResult, ResultAccumulator};
use std::path::Path;
use std::time::Instant;
use tokio::time::timeout;

/// Request body for script execution.
#[derive(Debug, Deserialize)]
pub struct PixieRequest {
    /// The PxL script. Falls back to the server's default script when absent.
    #[serde(default)]
    pub script: Option<String>,
}

/// Response for successful script execution.
#[derive(Debug, Serialize, Deserialize)]
pub struct PixieResponse {
    /// Column names of the first table.
    pub columns: Vec<String>,

    /// Stringified rows of every table, in arrival order.
    pub rows: Vec<Vec<String>>,

    /// Execution statistics reported by the query service.
    pub stats: serde_json::Value,
}

impl PixieResponse {
    fn new(result: AccumulatedResult, stats: serde_json::Value) -> Self {
        Self {
            columns: result.columns,
            rows: result.rows,
            stats,
        }
    }
}

/// Creates the script execution routes with application state.
pub fn pixie_routes(state: AppState) -> Router {
    Router::new()
        .route("/pixie", post(execute_pixie_script))
        .with_state(state)
}

/// Handler for script execution.
async fn execute_pixie_script(
    State(state): State<AppState>,
    payload: Result<Json<PixieRequest>, JsonRejection>,
) -> Result<Json<PixieResponse>, GatewayError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        GatewayError::Request(rejection.body_text())
    })?;

    let script = resolve_script(request.script, state.config().default_script.as_deref()).await?;

    let cluster = ClusterConfig::load(&state.config().cluster_config_path).map_err(|e| {
        tracing::error!(error = %e, "Failed to load cluster configuration");
        GatewayError::from(e)
    })?;

    tracing::info!(
        api_key_len = cluster.px_api_key.len(),
        cluster_id = %cluster.px_cluster_id,
        "Loaded cluster configuration"
    );

    let (result, stats) = run_script(&state, &cluster, &script).await.map_err(|e| {
        tracing::error!(error = %e, status = %e.status_code(), "Script request failed");
        e
    })?;

    tracing::info!(
        columns = result.columns.len(),
        rows = result.rows.len(),
        "Script results streamed"
    );

    Ok(Json(PixieResponse::new(result, stats)))
}

/// Picks the script from the request, or from the default script file.
async fn resolve_script(
    script: Option<String>,
    default_script: Option<&Path>,
) -> Result<String, GatewayError> {
    match (script, default_script) {
        (Some(script), _) if script.trim().is_empty() => {
            Err(GatewayError::Request("script must not be empty".to_string()))
        }
        (Some(script), _) => Ok(script),
        (None, Some(path)) => {
            let script = tokio::fs::read_to_string(path).await.map_err(|e| {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read default script"
                );
                GatewayError::Config(format!(
                    "could not read script file {}: {e}",
                    path.display()
                ))
            })?;
            if script.trim().is_empty() {
                return Err(GatewayError::Config(format!(
                    "script file {} is empty",
                    path.display()
                )));
            }
            Ok(script)
        }
        (None, None) => Err(GatewayError::Request("missing field `script`".to_string())),
    }
}

/// Connects, opens a session, and streams the script's results.
///
/// Nothing is returned unless the stream completes; on any error or timeout the
/// accumulator is dropped.
async fn run_script(
    state: &AppState,
    cluster: &ClusterConfig,
    script: &str,
) -> Result<(AccumulatedResult, serde_json::Value), GatewayError> {
    let cluster_id = cluster.px_cluster_id.as_str();
    let config = state.config();

    tracing::info!(cluster_id, "Opening session on cluster");
    let started = Instant::now();

    let session = timeout(config.session_timeout, async {
        let client = state
            .connector()
            .connect(&cluster.client_options())
            .await
            .map_err(|e| GatewayError::from_client(&e, Stage::Connect, cluster_id))?;

        let session = client
            .create_session(cluster_id)
            .await
            .map_err(|e| GatewayError::from_client(&e, Stage::Session, cluster_id))?;

        Ok::<_, GatewayError>(session)
    })
    .await
    .map_err(|_| GatewayError::Timeout(Stage::Session))??;

    tracing::info!(cluster_id, elapsed = ?started.elapsed(), "Session opened");

    let mut accumulator = ResultAccumulator::new();

    let stats = timeout(config.execution_timeout, async {
        let mut stream = session
            .execute_script(script)
            .await
            .map_err(|e| GatewayError::from_client(&e, Stage::Execute, cluster_id))?;

        stream
            .stream(&mut accumulator)
            .await
            .map_err(|e| GatewayError::from_client(&e, Stage::Execute, cluster_id))?;

        Ok::<_, GatewayError>(stream.stats())
    })
    .await
    .map_err(|_| GatewayError::Timeout(Stage::Execute))??;

    Ok((accumulator.into_result(), stats))
}
