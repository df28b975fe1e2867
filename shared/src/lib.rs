//! pxgate Shared Library
//!
//! This crate contains the types and logic shared by the pxgate gateway and
//! its command-line client.
//!
//! # Modules
//!
//! - [`models`] - Table metadata and record types delivered by the query service
//! - [`results`] - The streaming sink protocol and the result accumulator
//! - [`client`] - Query-service client traits, error classification, and a replay client
//! - [`config`] - File-backed cluster configuration
//!
//! # Example
//!
//! ```
//! use shared::models::{Datum, Record, SchemaAttribute, TableMetadata};
//! use shared::results::{ResultAccumulator, TableMuxer};
//!
//! let metadata = TableMetadata::new("conns", "0")
//!     .with_names(SchemaAttribute::ColNames, ["pod", "bytes"]);
//!
//! let mut acc = ResultAccumulator::new();
//! let table = acc.accept_table(&metadata).unwrap();
//! acc.record_handler(table)
//!     .unwrap()
//!     .handle_record(&Record::new("0", vec![Datum::from("kelvin"), Datum::Int64(512)]))
//!     .unwrap();
//!
//! assert_eq!(acc.result().rows, vec![vec!["kelvin", "512"]]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod config;
pub mod models;
pub mod results;

/// Re-export common dependencies for convenience.
pub use serde;
pub use serde_json;
