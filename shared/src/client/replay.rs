//! Fixture-backed query-service client.
//!
//! Replays recorded tables instead of talking to a cluster. Used by the test
//! suites and by the server when it runs in offline mode.
//!
//! # Fixture format
//!
//! ```json
//! {
//!   "api_key": "px-api-key",
//!   "clusters": ["b7e0a9a4-cluster"],
//!   "tables": [
//!     {
//!       "metadata": {"name": "conns", "id": "0", "attributes": {"Columns": ["pod"]}},
//!       "records": [[{"type": "string", "value": "pl/vizier-query-broker"}]]
//!     }
//!   ]
//! }
//! ```

use super::{
    ClientError, ClientOptions, CloudClient, Connector, ErrorKind, ResultStream, Session,
};
use crate::models::{Datum, Record, TableMetadata};
use crate::results::{SinkError, TableMuxer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised while loading a replay fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture file could not be read.
    #[error("Could not read replay fixture {path}: {source}")]
    Read {
        /// Path of the fixture.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The fixture file is not valid JSON.
    #[error("Could not parse replay fixture {path}: {source}")]
    Parse {
        /// Path of the fixture.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Point in the request flow where a scripted failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// While building the cloud client.
    Connect,
    /// While opening a session on the cluster.
    Session,
    /// While submitting the script.
    Execute,
    /// While streaming, after the first table's records were delivered.
    Stream,
}

/// A failure the replay client returns instead of succeeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedFailure {
    /// Where the failure fires.
    pub stage: FailureStage,
    /// Classification reported with the error.
    #[serde(default = "unclassified")]
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
}

fn unclassified() -> ErrorKind {
    ErrorKind::Unclassified
}

/// One recorded table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFixture {
    /// Table metadata delivered before the records.
    pub metadata: TableMetadata,
    /// Rows of typed cells.
    #[serde(default)]
    pub records: Vec<Vec<Datum>>,
}

/// Complete description of what the replay client returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayFixture {
    /// Only this API key is accepted when set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Known cluster ids. Any id is accepted when empty.
    #[serde(default)]
    pub clusters: Vec<String>,

    /// Delay before a session is opened.
    #[serde(default)]
    pub session_delay_ms: u64,

    /// Delay before the first table is streamed.
    #[serde(default)]
    pub execution_delay_ms: u64,

    /// Failure to return instead of results.
    #[serde(default)]
    pub failure: Option<ScriptedFailure>,

    /// Tables streamed on success.
    #[serde(default)]
    pub tables: Vec<TableFixture>,

    /// Stats returned verbatim. Synthesized from the replay when absent.
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
}

impl ReplayFixture {
    /// Loads a fixture from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let data = std::fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| FixtureError::Parse {
            path: display,
            source,
        })
    }

    /// Adds a table to the fixture.
    #[must_use]
    pub fn with_table(mut self, metadata: TableMetadata, records: Vec<Vec<Datum>>) -> Self {
        self.tables.push(TableFixture { metadata, records });
        self
    }

    /// Sets a scripted failure.
    #[must_use]
    pub fn with_failure(
        mut self,
        stage: FailureStage,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        self.failure = Some(ScriptedFailure {
            stage,
            kind,
            message: message.into(),
        });
        self
    }

    fn failure_at(&self, stage: FailureStage) -> Result<(), ClientError> {
        match &self.failure {
            Some(failure) if failure.stage == stage => {
                Err(ClientError::new(failure.kind, failure.message.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// [`Connector`] that hands out replaying clients.
#[derive(Debug, Clone)]
pub struct ReplayConnector {
    fixture: Arc<ReplayFixture>,
    sessions_opened: Arc<AtomicUsize>,
}

impl ReplayConnector {
    /// Creates a connector replaying the given fixture.
    #[must_use]
    pub fn new(fixture: ReplayFixture) -> Self {
        Self {
            fixture: Arc::new(fixture),
            sessions_opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of sessions successfully opened through this connector.
    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ReplayConnector {
    async fn connect(&self, options: &ClientOptions) -> Result<Box<dyn CloudClient>, ClientError> {
        self.fixture.failure_at(FailureStage::Connect)?;

        if let Some(expected) = &self.fixture.api_key {
            if *expected != options.api_key {
                return Err(ClientError::new(
                    ErrorKind::Unauthenticated,
                    "unauthenticated: invalid API key",
                ));
            }
        }

        tracing::debug!(cloud_addr = %options.cloud_addr, "Replay client connected");

        Ok(Box::new(ReplayClient {
            fixture: Arc::clone(&self.fixture),
            sessions_opened: Arc::clone(&self.sessions_opened),
        }))
    }
}

struct ReplayClient {
    fixture: Arc<ReplayFixture>,
    sessions_opened: Arc<AtomicUsize>,
}

#[async_trait]
impl CloudClient for ReplayClient {
    async fn create_session(&self, cluster_id: &str) -> Result<Box<dyn Session>, ClientError> {
        if self.fixture.session_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.fixture.session_delay_ms)).await;
        }

        self.fixture.failure_at(FailureStage::Session)?;

        let clusters = &self.fixture.clusters;
        if !clusters.is_empty() && !clusters.iter().any(|c| c == cluster_id) {
            return Err(ClientError::new(
                ErrorKind::NotFound,
                format!("cluster {cluster_id} not found"),
            ));
        }

        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ReplaySession {
            fixture: Arc::clone(&self.fixture),
        }))
    }
}

struct ReplaySession {
    fixture: Arc<ReplayFixture>,
}

#[async_trait]
impl Session for ReplaySession {
    async fn execute_script(&self, script: &str) -> Result<Box<dyn ResultStream>, ClientError> {
        self.fixture.failure_at(FailureStage::Execute)?;

        tracing::debug!(script_len = script.len(), "Replaying script execution");

        Ok(Box::new(ReplayStream {
            fixture: Arc::clone(&self.fixture),
            records_processed: 0,
            elapsed: Duration::ZERO,
        }))
    }
}

struct ReplayStream {
    fixture: Arc<ReplayFixture>,
    records_processed: usize,
    elapsed: Duration,
}

#[async_trait]
impl ResultStream for ReplayStream {
    async fn stream(&mut self, muxer: &mut dyn TableMuxer) -> Result<(), ClientError> {
        let started = Instant::now();

        if self.fixture.execution_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.fixture.execution_delay_ms)).await;
        }

        let fail_mid_stream = self.fixture.failure_at(FailureStage::Stream);

        for table in &self.fixture.tables {
            let metadata = &table.metadata;
            let id = muxer.accept_table(metadata)?;
            let handler = muxer
                .record_handler(id)
                .ok_or(SinkError::UnknownTable(id))?;

            handler.handle_init(metadata)?;
            for cells in &table.records {
                handler.handle_record(&Record::new(metadata.id.clone(), cells.clone()))?;
                self.records_processed += 1;
            }

            // A mid-stream failure leaves the first table without its done event.
            fail_mid_stream.clone()?;

            handler.handle_done()?;
        }

        fail_mid_stream?;

        self.elapsed = started.elapsed();
        Ok(())
    }

    fn stats(&self) -> serde_json::Value {
        self.fixture.stats.clone().unwrap_or_else(|| {
            serde_json::json!({
                "timing": {
                    "execution_time_ns": u64::try_from(self.elapsed.as_nanos()).unwrap_or(u64::MAX),
                    "compilation_time_ns": 0,
                },
                "bytes_processed": 0,
                "records_processed": self.records_processed,
            })
        })
    }
}
