//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use crate::config::Config;
use shared::client::replay::{ReplayConnector, ReplayFixture};
use shared::client::Connector;
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// Holds the query-service connector and the server configuration. No request
/// data is stored here; every request builds its own client, session, and
/// accumulator.
#[derive(Clone)]
pub struct AppState {
    /// Builds query-service clients.
    connector: Arc<dyn Connector>,
    /// Server configuration.
    config: Arc<Config>,
}

impl AppState {
    /// Creates a new application state with the given connector and configuration.
    pub fn new(connector: Arc<dyn Connector>, config: Config) -> Self {
        Self {
            connector,
            config: Arc::new(config),
        }
    }

    /// Creates a new application state backed by a replay fixture.
    ///
    /// This is useful for development and testing.
    #[must_use]
    pub fn with_replay(fixture: ReplayFixture, config: Config) -> Self {
        Self::new(Arc::new(ReplayConnector::new(fixture)), config)
    }

    /// Returns a reference to the connector.
    #[must_use]
    pub fn connector(&self) -> &dyn Connector {
        self.connector.as_ref()
    }

    /// Returns a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }
}
