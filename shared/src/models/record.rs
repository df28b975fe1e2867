//! Record and cell model.
//!
//! A [`Record`] is one row of a streamed table. Each cell is a typed [`Datum`]
//! whose `Display` implementation is its natural textual form.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Datum {
    /// Boolean value.
    Boolean(bool),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 128-bit integer, carried in JSON as a decimal string.
    Uint128(#[serde(with = "u128_string")] u128),
    /// 64-bit float.
    Float64(f64),
    /// String value.
    String(String),
    /// Nanoseconds since the Unix epoch, UTC.
    Time64ns(i64),
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Int64(i) => write!(f, "{i}"),
            Self::Uint128(u) => {
                let hex = format!("{u:032x}");
                write!(
                    f,
                    "{}-{}-{}-{}-{}",
                    &hex[0..8],
                    &hex[8..12],
                    &hex[12..16],
                    &hex[16..20],
                    &hex[20..32]
                )
            }
            Self::Float64(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Time64ns(ns) => {
                let ts = DateTime::<Utc>::from_timestamp_nanos(*ns);
                write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
            }
        }
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// JSON form of 128-bit values.
///
/// Adjacently tagged content is buffered when `"value"` precedes `"type"`, and
/// that buffer has no 128-bit integers. Values are written as decimal strings;
/// strings and numbers that fit in 64 bits are read back.
mod u128_string {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        deserializer.deserialize_any(U128Visitor)
    }

    struct U128Visitor;

    impl Visitor<'_> for U128Visitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal string or an unsigned integer")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u128, E> {
            Ok(u128::from(value))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<u128, E> {
            value.parse().map_err(E::custom)
        }
    }
}

/// One row of a streamed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Id of the table this record belongs to.
    pub table_id: String,

    /// Cells in column order.
    pub data: Vec<Datum>,
}

impl Record {
    /// Creates a record for the given table.
    #[must_use]
    pub fn new(table_id: impl Into<String>, data: Vec<Datum>) -> Self {
        Self {
            table_id: table_id.into(),
            data,
        }
    }

    /// Returns the textual form of every cell, in order.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.data.iter().map(ToString::to_string).collect()
    }
}
