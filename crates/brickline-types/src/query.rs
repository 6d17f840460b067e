//! Query results returned by the SQL warehouse.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column names plus rows of a finished statement.
///
/// Cells are kept as JSON values; the warehouse returns every cell as a
/// string or `null` in `JSON_ARRAY` format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in result order. Empty for statements without a result set.
    pub columns: Vec<String>,
    /// Row data, one inner vector per row.
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Create a result from columns and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Whether the statement produced a result set at all.
    pub fn has_result_set(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Whether there are no rows to show.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A table visible through the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Catalog (database) name.
    pub catalog: String,
    /// Schema name.
    pub schema: String,
    /// Table name.
    pub name: String,
}

impl std::fmt::Display for TableInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Database: {}, Schema: {}, Table: {}",
            self.catalog, self.schema, self.name
        )
    }
}
