//! Query-service client boundary.
//!
//! The gateway never talks to the remote cluster directly. It goes through the
//! traits in this module, which a client binding implements:
//!
//! - [`Connector`] builds an authenticated [`CloudClient`] from [`ClientOptions`]
//! - [`CloudClient`] opens a [`Session`] for one cluster
//! - [`Session`] executes a script and returns a [`ResultStream`]
//! - [`ResultStream`] drives a [`TableMuxer`] and exposes execution stats
//!
//! [`replay`] provides a fixture-backed implementation.

pub mod classify;
pub mod replay;

use crate::results::{SinkError, TableMuxer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a client failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credentials were rejected.
    Unauthenticated,
    /// The cluster or another named resource does not exist.
    NotFound,
    /// A deadline was exceeded on the remote side.
    DeadlineExceeded,
    /// The script failed to compile.
    Compilation,
    /// Any other remote failure.
    Internal,
    /// The binding could not classify the failure.
    Unclassified,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::NotFound => write!(f, "not_found"),
            Self::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Self::Compilation => write!(f, "compilation"),
            Self::Internal => write!(f, "internal"),
            Self::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Error returned by a query-service client binding.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    /// Failure classification reported by the binding.
    pub kind: ErrorKind,
    /// Human-readable message from the remote service.
    pub message: String,
}

impl ClientError {
    /// Creates an error with an explicit classification.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates an error the binding could not classify.
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unclassified, message)
    }

    /// Returns the effective classification.
    ///
    /// A typed kind is returned unchanged. [`ErrorKind::Unclassified`] falls back
    /// to [`classify::sniff`] on the message text.
    #[must_use]
    pub fn classified(&self) -> ErrorKind {
        match self.kind {
            ErrorKind::Unclassified => classify::sniff(&self.message),
            kind => kind,
        }
    }
}

impl From<SinkError> for ClientError {
    fn from(e: SinkError) -> Self {
        Self::new(ErrorKind::Internal, e.to_string())
    }
}

/// Options used to build a cloud client.
#[derive(Clone)]
pub struct ClientOptions {
    /// API key used to authenticate against the cloud.
    pub api_key: String,
    /// Address of the cloud endpoint.
    pub cloud_addr: String,
    /// Whether results are end-to-end encrypted.
    pub e2e_encryption: bool,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("api_key", &format_args!("<{} bytes>", self.api_key.len()))
            .field("cloud_addr", &self.cloud_addr)
            .field("e2e_encryption", &self.e2e_encryption)
            .finish()
    }
}

/// Builds cloud clients.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Creates an authenticated client.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created, for example when the
    /// API key is rejected.
    async fn connect(&self, options: &ClientOptions) -> Result<Box<dyn CloudClient>, ClientError>;
}

/// A client connected to the cloud.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Opens a session on the given cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster is unknown, the credentials are rejected,
    /// or the cluster cannot be reached.
    async fn create_session(&self, cluster_id: &str) -> Result<Box<dyn Session>, ClientError>;
}

/// An authenticated handle to one cluster.
#[async_trait]
pub trait Session: Send + Sync {
    /// Submits a script for execution.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be submitted.
    async fn execute_script(&self, script: &str) -> Result<Box<dyn ResultStream>, ClientError>;
}

/// Results of one script execution.
#[async_trait]
pub trait ResultStream: Send {
    /// Streams every table of the result into `muxer`.
    ///
    /// # Errors
    ///
    /// Returns an error if execution fails remotely or the sink rejects data.
    async fn stream(&mut self, muxer: &mut dyn TableMuxer) -> Result<(), ClientError>;

    /// Execution statistics, passed through unmodified.
    fn stats(&self) -> serde_json::Value;
}
