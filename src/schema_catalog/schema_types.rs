//! In-memory schema model.
//!
//! A [`SchemaSnapshot`] is produced once per analysis cycle and is immutable
//! for the lifetime of a planning session; re-analysis replaces it wholesale.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type as reported by the catalog, e.g. `int(11)` or `enum(a,b)`.
    /// Enum literals are normalized but not otherwise parsed.
    pub data_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub comment: String,
    /// Primary-key column names in ordinal order
    pub primary_keys: Vec<String>,
    pub columns: Vec<ColumnSchema>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// First primary-key column, if any. Naming-pattern inference only
    /// considers single-column keys.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_keys.first().map(String::as_str)
    }
}

/// A read-only snapshot of one database schema.
///
/// Tables are keyed by name; iteration order is the sorted table name order so
/// downstream passes are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaSnapshot {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }
}

/// Normalize a declared enum type by stripping quotes and padding from its
/// literals: `enum('a', 'b')` becomes `enum(a,b)`. Non-enum types pass
/// through unchanged.
pub fn normalize_enum_type(declared: &str) -> String {
    let Some(inner) = declared
        .strip_prefix("enum(")
        .and_then(|rest| rest.strip_suffix(')'))
    else {
        return declared.to_string();
    };

    let literals: Vec<String> = inner
        .split(',')
        .map(|v| v.trim().trim_matches('\'').to_string())
        .collect();
    format!("enum({})", literals.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_enum_type() {
        assert_eq!(
            normalize_enum_type("enum('active', 'inactive', 'suspended')"),
            "enum(active,inactive,suspended)"
        );
        assert_eq!(normalize_enum_type("enum('a')"), "enum(a)");
    }

    #[test]
    fn test_normalize_non_enum_passthrough() {
        assert_eq!(normalize_enum_type("int(11)"), "int(11)");
        assert_eq!(normalize_enum_type("varchar(100)"), "varchar(100)");
        assert_eq!(normalize_enum_type("text"), "text");
    }

    #[test]
    fn test_snapshot_sorted_iteration() {
        let snapshot = SchemaSnapshot::new(vec![
            TableSchema {
                name: "users".to_string(),
                comment: String::new(),
                primary_keys: vec![],
                columns: vec![],
                foreign_keys: vec![],
            },
            TableSchema {
                name: "orders".to_string(),
                comment: String::new(),
                primary_keys: vec![],
                columns: vec![],
                foreign_keys: vec![],
            },
        ]);

        let names: Vec<&str> = snapshot.table_names().collect();
        assert_eq!(names, vec!["orders", "users"]);
        assert!(snapshot.contains("users"));
        assert!(!snapshot.contains("reviews"));
    }
}
