//! Table metadata model.
//!
//! Remote query-service versions describe a table's schema in different ways.
//! Rather than probing an opaque value at runtime, the known shapes are modelled
//! as a closed set of variants and column names are derived by matching on them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic data type of a column as reported by the query service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Boolean values.
    Boolean,
    /// Signed 64-bit integers.
    Int64,
    /// Unsigned 128-bit integers (e.g. process identifiers).
    Uint128,
    /// 64-bit floating point numbers.
    Float64,
    /// UTF-8 strings.
    String,
    /// Nanosecond-precision timestamps.
    Time64ns,
    /// The service did not report a type.
    #[default]
    Unknown,
}

/// A single field descriptor carrying its own column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column name.
    pub name: String,

    /// Column data type.
    #[serde(default)]
    pub data_type: DataType,
}

impl FieldDescriptor {
    /// Creates a field descriptor with the given name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Schema attributes a table description may expose, in probing priority order.
///
/// The derived `Ord` follows declaration order, so iterating a `BTreeMap` keyed
/// by this type visits attributes from highest to lowest priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SchemaAttribute {
    /// A direct list of column names.
    Columns,
    /// An alternate naming for the list of column names.
    ColNames,
    /// A list of field descriptors.
    Fields,
    /// A list of schema entries, each with a name.
    Schema,
}

impl SchemaAttribute {
    /// All attributes from highest to lowest priority.
    pub const PRIORITY: [Self; 4] = [Self::Columns, Self::ColNames, Self::Fields, Self::Schema];
}

impl std::fmt::Display for SchemaAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Columns => write!(f, "Columns"),
            Self::ColNames => write!(f, "ColNames"),
            Self::Fields => write!(f, "Fields"),
            Self::Schema => write!(f, "Schema"),
        }
    }
}

/// The value stored under a schema attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSource {
    /// A flat list of column names.
    Names(Vec<String>),
    /// A list of descriptors, each naming one column.
    Descriptors(Vec<FieldDescriptor>),
}

impl ColumnSource {
    /// Returns the column names this source yields, in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        match self {
            Self::Names(names) => names.clone(),
            Self::Descriptors(fields) => fields.iter().map(|f| f.name.clone()).collect(),
        }
    }
}

/// Metadata describing one table of a script's output.
///
/// # Example
///
/// ```
/// use shared::models::{SchemaAttribute, TableMetadata};
///
/// let metadata = TableMetadata::new("http_events", "0")
///     .with_names(SchemaAttribute::Columns, ["upid", "req_path"]);
///
/// assert_eq!(metadata.column_names(), vec!["upid", "req_path"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name.
    pub name: String,

    /// Table id used to route records to this table.
    pub id: String,

    /// Schema attributes exposed by this table description.
    #[serde(default)]
    pub attributes: BTreeMap<SchemaAttribute, ColumnSource>,
}

impl TableMetadata {
    /// Creates metadata with no schema attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets a name-list attribute.
    #[must_use]
    pub fn with_names<I, S>(mut self, attribute: SchemaAttribute, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect();
        self.attributes.insert(attribute, ColumnSource::Names(names));
        self
    }

    /// Sets a descriptor-list attribute.
    #[must_use]
    pub fn with_descriptors(
        mut self,
        attribute: SchemaAttribute,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        self.attributes.insert(attribute, ColumnSource::Descriptors(fields));
        self
    }

    /// Derives the column names of this table.
    ///
    /// Attributes are probed in [`SchemaAttribute::PRIORITY`] order and the first
    /// one yielding at least one name wins. Returns an empty list when no
    /// attribute yields names.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        SchemaAttribute::PRIORITY
            .iter()
            .filter_map(|attribute| self.attributes.get(attribute))
            .map(ColumnSource::column_names)
            .find(|names| !names.is_empty())
            .unwrap_or_default()
    }
}
