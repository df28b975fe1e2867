//! Streaming result sink protocol.
//!
//! The query service pushes results through a two-phase protocol: a table is
//! first accepted by a [`TableMuxer`], which hands back a [`TableId`] token, and
//! the records of that table are then delivered to the [`TableRecordHandler`]
//! the token resolves to.
//!
//! ```text
//! accept_table(metadata) -> id
//! record_handler(id).handle_init(metadata)
//! record_handler(id).handle_record(record)   // zero or more times
//! record_handler(id).handle_done()
//! ```

mod accumulator;

pub use accumulator::{AccumulatedResult, ResultAccumulator};

use crate::models::{Record, TableMetadata};
use thiserror::Error;

/// Token identifying the record sink for one accepted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub usize);

/// Errors raised by a result sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A callback referenced a table that was never accepted.
    #[error("Unknown table handle: {0:?}")]
    UnknownTable(TableId),

    /// The sink rejected the data.
    #[error("Sink error: {0}")]
    Rejected(String),
}

/// Accepts tables as they begin streaming and routes them to record handlers.
pub trait TableMuxer: Send {
    /// Called once per table, before any of its records.
    ///
    /// # Errors
    ///
    /// Returns an error if the muxer refuses the table.
    fn accept_table(&mut self, metadata: &TableMetadata) -> Result<TableId, SinkError>;

    /// Resolves a token returned by [`accept_table`](Self::accept_table).
    fn record_handler(&mut self, table: TableId) -> Option<&mut dyn TableRecordHandler>;
}

/// Receives the records of a single table.
pub trait TableRecordHandler: Send {
    /// Called once before the first record of the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler cannot start receiving records.
    fn handle_init(&mut self, metadata: &TableMetadata) -> Result<(), SinkError>;

    /// Called once per record, in delivery order.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be handled.
    fn handle_record(&mut self, record: &Record) -> Result<(), SinkError>;

    /// Called once when the table's stream ends successfully.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails to complete.
    fn handle_done(&mut self) -> Result<(), SinkError>;
}
