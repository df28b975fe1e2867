//! Data models for streamed query results.
//!
//! This module contains the table metadata and record types delivered by the
//! query service while a script executes.

pub mod metadata;
pub mod record;

pub use metadata::{ColumnSource, DataType, FieldDescriptor, SchemaAttribute, TableMetadata};
pub use record::{Datum, Record};
