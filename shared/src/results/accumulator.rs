//! In-memory table accumulator.
//!
//! Collects a streamed script result into a flat `columns`/`rows` structure.

use super::{SinkError, TableId, TableMuxer, TableRecordHandler};
use crate::models::{Record, TableMetadata};
use serde::{Deserialize, Serialize};

/// A flat tabular result.
///
/// Row lengths are not checked against `columns`; each cell is stringified on
/// its own and rows are kept as delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedResult {
    /// Column names derived from the first table's metadata.
    pub columns: Vec<String>,

    /// Stringified rows in arrival order.
    pub rows: Vec<Vec<String>>,
}

/// Result sink that accumulates every streamed table into one [`AccumulatedResult`].
///
/// The accumulator is its own record handler for every table it accepts.
///
/// # Example
///
/// ```
/// use shared::models::{Datum, Record, SchemaAttribute, TableMetadata};
/// use shared::results::{ResultAccumulator, TableMuxer};
///
/// let metadata = TableMetadata::new("http_events", "0")
///     .with_names(SchemaAttribute::Columns, ["upid", "req_path"]);
///
/// let mut acc = ResultAccumulator::new();
/// let table = acc.accept_table(&metadata).unwrap();
/// let handler = acc.record_handler(table).unwrap();
/// handler.handle_init(&metadata).unwrap();
/// handler
///     .handle_record(&Record::new("0", vec![Datum::from("12345"), Datum::from("/api/users")]))
///     .unwrap();
/// handler.handle_done().unwrap();
///
/// let result = acc.into_result();
/// assert_eq!(result.columns, vec!["upid", "req_path"]);
/// assert_eq!(result.rows, vec![vec!["12345", "/api/users"]]);
/// ```
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    result: AccumulatedResult,
    tables_accepted: usize,
    tables_done: usize,
    mismatched_rows: usize,
}

impl ResultAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the result accumulated so far.
    #[must_use]
    pub fn result(&self) -> &AccumulatedResult {
        &self.result
    }

    /// Number of tables accepted.
    #[must_use]
    pub fn tables_accepted(&self) -> usize {
        self.tables_accepted
    }

    /// Number of tables whose stream completed.
    #[must_use]
    pub fn tables_done(&self) -> usize {
        self.tables_done
    }

    /// Number of rows whose length differed from the column count.
    #[must_use]
    pub fn mismatched_rows(&self) -> usize {
        self.mismatched_rows
    }

    /// Consumes the accumulator and returns the accumulated result.
    #[must_use]
    pub fn into_result(self) -> AccumulatedResult {
        self.result
    }
}

impl TableMuxer for ResultAccumulator {
    fn accept_table(&mut self, metadata: &TableMetadata) -> Result<TableId, SinkError> {
        // Only the first table's metadata defines the columns.
        if self.tables_accepted == 0 {
            self.result.columns = metadata.column_names();
            if self.result.columns.is_empty() {
                tracing::warn!(table = %metadata.name, "No column names found in table metadata");
            }
        }

        let id = TableId(self.tables_accepted);
        self.tables_accepted += 1;

        tracing::debug!(
            table = %metadata.name,
            table_id = %metadata.id,
            columns = self.result.columns.len(),
            "Accepted table"
        );

        Ok(id)
    }

    fn record_handler(&mut self, table: TableId) -> Option<&mut dyn TableRecordHandler> {
        if table.0 < self.tables_accepted {
            Some(self)
        } else {
            None
        }
    }
}

impl TableRecordHandler for ResultAccumulator {
    fn handle_init(&mut self, _metadata: &TableMetadata) -> Result<(), SinkError> {
        Ok(())
    }

    fn handle_record(&mut self, record: &Record) -> Result<(), SinkError> {
        if !self.result.columns.is_empty() && record.data.len() != self.result.columns.len() {
            self.mismatched_rows += 1;
        }
        self.result.rows.push(record.to_strings());
        Ok(())
    }

    fn handle_done(&mut self) -> Result<(), SinkError> {
        self.tables_done += 1;

        if self.mismatched_rows > 0 {
            tracing::debug!(
                mismatched = self.mismatched_rows,
                columns = self.result.columns.len(),
                "Rows with a cell count different from the column count"
            );
        }

        tracing::debug!(rows = self.result.rows.len(), "Table stream done");
        Ok(())
    }
}
