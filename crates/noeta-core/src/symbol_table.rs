//! Alias registry shared by the analyzer and its callers.
//!
//! A [`SymbolTable`] maps dataset aliases to their [`DatasetInfo`]. The same
//! table may be handed to several compilations in a row so that aliases
//! defined by one fragment stay visible to the next, and it can be brought
//! in line with the live values of an execution environment through
//! [`SymbolTable::reconcile`].

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnInfo, DataType, DatasetInfo};

/// A value bound to a name in an execution environment.
///
/// Only table-shaped values are of interest; everything else is ignored
/// during reconciliation.
///
/// ```
/// # use noeta_core::RuntimeValue;
/// let value: RuntimeValue = serde_json::from_str(
///     r#"{"kind": "table", "columns": {"price": "float64", "region": "object"}}"#,
/// ).unwrap();
/// assert!(value.is_table());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuntimeValue {
    /// A table with its column names and runtime dtype names, in order.
    Table {
        #[serde(default)]
        columns: IndexMap<String, String>,
    },
    /// Any non-tabular value.
    Other,
}

impl RuntimeValue {
    pub fn is_table(&self) -> bool {
        matches!(self, RuntimeValue::Table { .. })
    }
}

/// Registry of known datasets plus the order in which they were defined.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    datasets: IndexMap<String, DatasetInfo>,
    history: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a dataset under its own name.
    pub fn define(&mut self, info: DatasetInfo) {
        let name = info.name().to_string();
        debug!(name = name.as_str(), known_schema = info.is_known(); "Defining dataset");
        self.history.push(name.clone());
        self.datasets.insert(name, info);
    }

    pub fn lookup(&self, name: &str) -> Option<&DatasetInfo> {
        self.datasets.get(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    /// All defined aliases, in order of first definition.
    pub fn all_names(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }

    /// Every definition made, in order, including redefinitions.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Forget every dataset and the definition history.
    pub fn clear(&mut self) {
        self.datasets.clear();
        self.history.clear();
    }

    /// Register every table-shaped binding that is not tracked yet.
    ///
    /// Column types come from the runtime dtype names and the provenance is
    /// recorded as `runtime:<name>`. Aliases already present are left alone,
    /// so schemas derived by the analyzer win over the runtime view. Returns
    /// the names that were registered.
    pub fn reconcile<I, S>(&mut self, bindings: I) -> Vec<String>
    where
        I: IntoIterator<Item = (S, RuntimeValue)>,
        S: Into<String>,
    {
        let mut registered = Vec::new();

        for (name, value) in bindings {
            let name = name.into();
            let RuntimeValue::Table { columns } = value else {
                continue;
            };
            if self.exists(&name) {
                continue;
            }

            let info = DatasetInfo::new(name.clone(), format!("runtime:{name}")).with_columns(
                columns.iter().map(|(column, dtype)| {
                    ColumnInfo::new(column.clone(), DataType::from_runtime_dtype(dtype))
                }),
            );
            self.define(info);
            registered.push(name);
        }

        if !registered.is_empty() {
            info!(count = registered.len(); "Reconciled runtime datasets");
        }
        registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[(&str, &str)]) -> RuntimeValue {
        RuntimeValue::Table {
            columns: columns
                .iter()
                .map(|(c, d)| (c.to_string(), d.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_define_and_lookup() {
        let mut table = SymbolTable::new();
        assert!(table.is_empty());

        table.define(DatasetInfo::new("sales", "sales.csv"));

        assert!(table.exists("sales"));
        assert!(!table.exists("Sales"));
        assert_eq!(
            table.lookup("sales").map(DatasetInfo::provenance),
            Some("sales.csv")
        );
        assert_eq!(table.all_names(), vec!["sales"]);
    }

    #[test]
    fn test_redefinition_replaces_and_records_history() {
        let mut table = SymbolTable::new();
        table.define(DatasetInfo::new("a", "first"));
        table.define(DatasetInfo::new("b", "second"));
        table.define(DatasetInfo::new("a", "third"));

        assert_eq!(table.len(), 2);
        assert_eq!(table.all_names(), vec!["a", "b"]);
        assert_eq!(table.history(), ["a", "b", "a"]);
        assert_eq!(table.lookup("a").map(DatasetInfo::provenance), Some("third"));
    }

    #[test]
    fn test_clear() {
        let mut table = SymbolTable::new();
        table.define(DatasetInfo::new("a", "first"));
        table.clear();

        assert!(table.is_empty());
        assert!(table.history().is_empty());
    }

    #[test]
    fn test_reconcile_registers_tables_only() {
        let mut symbols = SymbolTable::new();
        let registered = symbols.reconcile([
            ("df", table(&[("price", "float64"), ("region", "object")])),
            ("threshold", RuntimeValue::Other),
        ]);

        assert_eq!(registered, vec!["df".to_string()]);
        let info = symbols.lookup("df").expect("df registered");
        assert_eq!(info.provenance(), "runtime:df");
        assert_eq!(
            info.column("price").map(ColumnInfo::dtype),
            Some(DataType::Numeric)
        );
        assert_eq!(
            info.column("region").map(ColumnInfo::dtype),
            Some(DataType::String)
        );
        assert!(!symbols.exists("threshold"));
    }

    #[test]
    fn test_reconcile_keeps_existing_entries() {
        let mut symbols = SymbolTable::new();
        symbols.define(DatasetInfo::new("df", "df.csv"));

        let registered = symbols.reconcile([("df", table(&[("a", "int64")]))]);

        assert!(registered.is_empty());
        assert_eq!(symbols.lookup("df").map(DatasetInfo::provenance), Some("df.csv"));
    }

    #[test]
    fn test_runtime_value_deserialize() {
        let value: RuntimeValue =
            serde_json::from_str(r#"{"kind": "table", "columns": {"a": "int64", "b": "bool"}}"#)
                .unwrap();
        assert_eq!(value, table(&[("a", "int64"), ("b", "bool")]));

        let value: RuntimeValue = serde_json::from_str(r#"{"kind": "other"}"#).unwrap();
        assert_eq!(value, RuntimeValue::Other);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn check_history_tracks_definitions(names: &[String]) -> Result<(), TestCaseError> {
        let mut table = SymbolTable::new();
        for name in names {
            table.define(DatasetInfo::new(name.clone(), "test"));
        }

        prop_assert_eq!(table.history(), names);
        for name in names {
            prop_assert!(table.exists(name));
        }
        prop_assert!(table.len() <= names.len());
        Ok(())
    }

    proptest! {
        #[test]
        fn history_tracks_definitions(names in prop::collection::vec("[a-z][a-z0-9_]{0,8}", 0..12)) {
            check_history_tracks_definitions(&names)?;
        }
    }
}
