//! Schema descriptions for datasets tracked during analysis.
//!
//! A [`DatasetInfo`] either knows every column of its dataset or knows
//! nothing about it. An empty column map means "unknown schema" and disables
//! column checks for that dataset.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Coarse column type used for type checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Numeric,
    Datetime,
    Boolean,
    #[default]
    Unknown,
}

impl DataType {
    /// Returns the lowercase name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Numeric => "numeric",
            DataType::Datetime => "datetime",
            DataType::Boolean => "boolean",
            DataType::Unknown => "unknown",
        }
    }

    /// Parse a type name as written in programs (`type="numeric"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" | "str" | "text" | "object" => Some(DataType::String),
            "numeric" | "number" => Some(DataType::Numeric),
            "datetime" | "date" => Some(DataType::Datetime),
            "boolean" | "bool" => Some(DataType::Boolean),
            _ => None,
        }
    }

    /// Map a runtime dtype name such as `int64`, `float32`, `datetime64[ns]`
    /// or `object` onto a coarse type.
    pub fn from_runtime_dtype(dtype: &str) -> Self {
        let dtype = dtype.to_ascii_lowercase();
        if ["int", "float", "number"].iter().any(|p| dtype.contains(p)) {
            DataType::Numeric
        } else if dtype.contains("datetime") || dtype.contains("timestamp") {
            DataType::Datetime
        } else if dtype.contains("bool") {
            DataType::Boolean
        } else if dtype.contains("object") || dtype.contains("str") {
            DataType::String
        } else {
            DataType::Unknown
        }
    }

    /// Whether this type carries information usable for type checks.
    pub fn is_known(&self) -> bool {
        !matches!(self, DataType::Unknown)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    name: String,
    dtype: DataType,
    nullable: bool,
}

impl ColumnInfo {
    /// Create a nullable column of the given type.
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            nullable: true,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Copy of this column under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Schema knowledge about one named dataset.
///
/// `provenance` records where the schema came from (a file path, the
/// statement that derived it, or `runtime:<name>` for reconciled values).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    name: String,
    columns: IndexMap<String, ColumnInfo>,
    provenance: String,
}

impl DatasetInfo {
    /// Create a dataset with an unknown schema.
    pub fn new(name: impl Into<String>, provenance: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            provenance: provenance.into(),
        }
    }

    /// Replace the schema with the given columns, in order.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnInfo>) -> Self {
        self.columns = columns
            .into_iter()
            .map(|column| (column.name.clone(), column))
            .collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provenance(&self) -> &str {
        &self.provenance
    }

    /// `true` when the full column set is known.
    pub fn is_known(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.values()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Copy the schema under a new name and provenance.
    pub fn derive(&self, name: impl Into<String>, provenance: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: self.columns.clone(),
            provenance: provenance.into(),
        }
    }
}
