//! Gateway error taxonomy.
//!
//! Every failure of a `/pixie` request ends up as one [`GatewayError`], which is
//! mapped once to an HTTP status and a plain-text body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::client::{ClientError, ErrorKind};
use shared::config::ConfigError;
use std::fmt;
use thiserror::Error;

/// Step of the request flow that talks to the query service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Building the cloud client.
    Connect,
    /// Opening a session on the cluster.
    Session,
    /// Executing the script and streaming its results.
    Execute,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect | Self::Session => write!(f, "connecting to cluster"),
            Self::Execute => write!(f, "executing script"),
        }
    }
}

/// Errors returned by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The inbound request is malformed.
    #[error("Invalid request: {0}")]
    Request(String),

    /// The gateway configuration is missing or invalid.
    #[error("Failed to load configuration: {0}")]
    Config(String),

    /// The remote service rejected the credentials.
    #[error("Authentication failed: {0}")]
    Auth(&'static str),

    /// The cluster id is unknown.
    #[error("Cluster not found: {0}")]
    NotFound(String),

    /// A session or execution deadline was exceeded.
    #[error("Timeout {0}")]
    Timeout(Stage),

    /// The script failed remote validation.
    #[error("PxL compilation error: {0}")]
    Compilation(String),

    /// Any other remote failure.
    #[error("Failed {0}: {1}")]
    Execution(Stage, String),
}

impl GatewayError {
    /// Maps a client error raised at `stage` into the gateway taxonomy.
    #[must_use]
    pub fn from_client(err: &ClientError, stage: Stage, cluster_id: &str) -> Self {
        match (err.classified(), stage) {
            (ErrorKind::Unauthenticated, Stage::Connect) => Self::Auth("Invalid API key"),
            (ErrorKind::Unauthenticated, Stage::Session) => {
                Self::Auth("Invalid API key or cluster ID")
            }
            (ErrorKind::Unauthenticated, Stage::Execute) => {
                Self::Auth("Invalid or expired token")
            }
            (ErrorKind::NotFound, Stage::Connect | Stage::Session) => {
                Self::NotFound(cluster_id.to_string())
            }
            (ErrorKind::DeadlineExceeded, _) => Self::Timeout(stage),
            (ErrorKind::Compilation, _) => Self::Compilation(err.message.clone()),
            (ErrorKind::NotFound | ErrorKind::Internal | ErrorKind::Unclassified, _) => {
                Self::Execution(stage, err.message.clone())
            }
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Request(_) | Self::Compilation(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Execution(..) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<ConfigError> for GatewayError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
