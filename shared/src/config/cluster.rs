//! Cluster connection settings.
//!
//! Loaded from a JSON file on every request so edits take effect without a
//! restart.

use crate::client::ClientOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Errors that can occur while loading the cluster configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Could not read config file {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("Could not parse config file {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A required field is missing or empty.
    #[error("{0} is not set in config file")]
    MissingField(&'static str),

    /// A field is set but malformed.
    #[error("Validation failed: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Credentials and addressing for the remote cluster.
///
/// # Example
///
/// ```
/// use shared::config::ClusterConfig;
///
/// let config: ClusterConfig = serde_json::from_str(
///     r#"{"px_api_key": "px-api-1", "px_cluster_id": "c-1", "cloud_addr": "withpixie.ai:443"}"#,
/// )
/// .unwrap();
///
/// assert!(config.validate_config().is_ok());
/// ```
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct ClusterConfig {
    /// API key for the cloud.
    #[serde(default)]
    pub px_api_key: String,

    /// Id of the cluster scripts run on.
    #[serde(default)]
    #[validate(length(max = 128, message = "Cluster id is too long"))]
    pub px_cluster_id: String,

    /// Address of the cloud endpoint, as `host:port`.
    #[serde(default)]
    #[validate(custom(function = "validate_cloud_addr"))]
    pub cloud_addr: String,
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("px_api_key", &format_args!("<{} bytes>", self.px_api_key.len()))
            .field("px_cluster_id", &self.px_cluster_id)
            .field("cloud_addr", &self.cloud_addr)
            .finish()
    }
}

impl ClusterConfig {
    /// Reads and validates the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any of the
    /// three fields is empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;

        config.validate_config()?;
        Ok(config)
    }

    /// Validates that every field is set and well formed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first empty field, or
    /// [`ConfigError::Invalid`] when a set field is malformed.
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        if self.px_api_key.trim().is_empty() {
            return Err(ConfigError::MissingField("PX_API_KEY"));
        }
        if self.px_cluster_id.trim().is_empty() {
            return Err(ConfigError::MissingField("PX_CLUSTER_ID"));
        }
        if self.cloud_addr.trim().is_empty() {
            return Err(ConfigError::MissingField("CLOUD_ADDR"));
        }
        self.validate()?;
        Ok(())
    }

    /// Builds client options with end-to-end encryption enabled.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_key: self.px_api_key.clone(),
            cloud_addr: self.cloud_addr.clone(),
            e2e_encryption: true,
        }
    }
}

fn validate_cloud_addr(addr: &str) -> Result<(), ValidationError> {
    match addr.trim().rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(ValidationError::new("cloud_addr")
            .with_message("Cloud address must be host:port".into())),
    }
}
