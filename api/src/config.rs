//! Server configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use anyhow::{bail, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => bail!("Unknown log format: {other}"),
        }
    }
}

/// Server configuration.
///
/// Configuration values can be set via environment variables:
/// - `PXGATE_HOST`: The host address to bind to (default: "0.0.0.0")
/// - `PXGATE_PORT`: The port to listen on (default: 8080)
/// - `PXGATE_CONFIG_FILE`: Cluster configuration file (default: "config.json")
/// - `PXGATE_STATIC_DIR`: Directory holding `openapi.json` and `index.html` (default: "static")
/// - `PXGATE_DEFAULT_SCRIPT`: Script file used when a request carries no script
/// - `PXGATE_SESSION_TIMEOUT_SECS`: Budget for opening a cluster session (default: 60)
/// - `PXGATE_EXECUTION_TIMEOUT_SECS`: Budget for executing and streaming a script (default: 60)
/// - `PXGATE_REPLAY_FILE`: Replay fixture served instead of a live cluster
/// - `PXGATE_LOG_FORMAT`: `pretty` or `json` (default: "pretty")
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Path of the cluster configuration file, read on every request.
    pub cluster_config_path: PathBuf,
    /// Directory served for `/` and `/openapi.json`.
    pub static_dir: PathBuf,
    /// Script file used when a request does not carry a script.
    pub default_script: Option<PathBuf>,
    /// Budget for connecting and opening a session.
    pub session_timeout: Duration,
    /// Budget for executing a script and streaming its results.
    pub execution_timeout: Duration,
    /// Replay fixture used as the query-service backend.
    pub replay_file: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `PXGATE_PORT` is set but cannot be parsed as a valid port number
    /// - a timeout variable is set but is not a whole number of seconds
    /// - `PXGATE_LOG_FORMAT` is set to an unknown format
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = std::env::var("PXGATE_HOST").unwrap_or(defaults.host);

        let port = std::env::var("PXGATE_PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()?
            .unwrap_or(defaults.port);

        let cluster_config_path = std::env::var("PXGATE_CONFIG_FILE")
            .map_or(defaults.cluster_config_path, PathBuf::from);

        let static_dir =
            std::env::var("PXGATE_STATIC_DIR").map_or(defaults.static_dir, PathBuf::from);

        let default_script = std::env::var("PXGATE_DEFAULT_SCRIPT").ok().map(PathBuf::from);

        let session_timeout =
            secs_from_env("PXGATE_SESSION_TIMEOUT_SECS")?.unwrap_or(defaults.session_timeout);

        let execution_timeout =
            secs_from_env("PXGATE_EXECUTION_TIMEOUT_SECS")?.unwrap_or(defaults.execution_timeout);

        let replay_file = std::env::var("PXGATE_REPLAY_FILE").ok().map(PathBuf::from);

        let log_format = std::env::var("PXGATE_LOG_FORMAT")
            .ok()
            .map(|f| f.parse::<LogFormat>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            cluster_config_path,
            static_dir,
            default_script,
            session_timeout,
            execution_timeout,
            replay_file,
            log_format,
        })
    }

    /// Returns the socket address for binding.
    ///
    /// # Panics
    ///
    /// Panics if the host and port combination cannot be parsed as a valid socket address.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address from config")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cluster_config_path: PathBuf::from("config.json"),
            static_dir: PathBuf::from("static"),
            default_script: None,
            session_timeout: Duration::from_secs(60),
            execution_timeout: Duration::from_secs(60),
            replay_file: None,
            log_format: LogFormat::Pretty,
        }
    }
}

fn secs_from_env(name: &str) -> Result<Option<Duration>> {
    std::env::var(name)
        .ok()
        .map(|v| v.parse::<u64>().map(Duration::from_secs))
        .transpose()
        .map_err(Into::into)
}
