//! Schema metadata catalog
//!
//! A static, read-only catalogue of every table and column known to the
//! system: base type, array-ness, nullability, enum reference, and
//! foreign-key references. The artifact is produced by an external
//! generator as a nested `schema -> table -> column` mapping and is
//! consumed here, never mutated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabula_core::{SchemaBaseType, TableRef};

// ============================================================================
// ForeignKeyRef
// ============================================================================

/// A foreign-key reference carried by a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table (possibly schema-qualified)
    pub table: String,

    /// Referenced column (usually the primary key)
    pub column: String,
}

impl ForeignKeyRef {
    /// Create a new foreign-key reference
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

// ============================================================================
// ColumnInfo
// ============================================================================

/// Generated metadata for one column.
///
/// `table` and `column` duplicate the map keys of the artifact; the
/// catalog fills them in after deserialization so a `ColumnInfo` is
/// self-describing when passed around on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ColumnInfo {
    /// Owning table name
    #[serde(default)]
    pub table: String,

    /// Column name
    #[serde(default)]
    pub column: String,

    /// Base type as reported by the generator
    #[serde(default)]
    pub base_type: SchemaBaseType,

    /// Whether the column holds an array of the base type
    #[serde(default)]
    pub is_array: bool,

    /// Whether the column accepts NULL
    #[serde(default)]
    pub is_nullable: bool,

    /// Name of the database enum backing this column, if any
    #[serde(default)]
    pub enum_ref: Option<String>,

    /// Foreign-key references carried by this column
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl ColumnInfo {
    /// Create column metadata with the given base type
    pub fn new(base_type: SchemaBaseType) -> Self {
        Self {
            base_type,
            ..Self::default()
        }
    }

    /// Mark the column as an array
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Mark the column as nullable
    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    /// Attach a database enum reference
    pub fn with_enum(mut self, enum_ref: impl Into<String>) -> Self {
        self.enum_ref = Some(enum_ref.into());
        self
    }

    /// Attach a foreign-key reference
    pub fn with_foreign_key(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_keys.push(ForeignKeyRef::new(table, column));
        self
    }

    /// Check if the column carries at least one foreign-key reference
    pub fn has_foreign_key(&self) -> bool {
        !self.foreign_keys.is_empty()
    }
}

// ============================================================================
// SchemaCatalog
// ============================================================================

/// The full generated schema artifact: `schema -> table -> column`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    schemas: HashMap<String, HashMap<String, HashMap<String, ColumnInfo>>>,
}

impl SchemaCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from its JSON artifact string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut catalog: Self = serde_json::from_str(json)?;
        catalog.finalize();
        Ok(catalog)
    }

    /// Fill in the `table`/`column` fields from the map keys.
    ///
    /// Generated artifacts usually omit them since they duplicate the
    /// nesting structure.
    pub fn finalize(&mut self) {
        for tables in self.schemas.values_mut() {
            for (table_name, columns) in tables.iter_mut() {
                for (column_name, info) in columns.iter_mut() {
                    info.table = table_name.clone();
                    info.column = column_name.clone();
                }
            }
        }
    }

    /// Insert column metadata (used by fixtures and builders).
    pub fn add_column(
        &mut self,
        table: &TableRef,
        column: impl Into<String>,
        mut info: ColumnInfo,
    ) {
        let column = column.into();
        info.table = table.table.clone();
        info.column = column.clone();
        self.schemas
            .entry(table.schema.clone())
            .or_default()
            .entry(table.table.clone())
            .or_default()
            .insert(column, info);
    }

    /// Look up one column's metadata.
    pub fn column(&self, table: &TableRef, field: &str) -> Option<&ColumnInfo> {
        self.schemas
            .get(&table.schema)?
            .get(&table.table)?
            .get(field)
    }

    /// Get every column of a table.
    pub fn table_columns(&self, table: &TableRef) -> Option<&HashMap<String, ColumnInfo>> {
        self.schemas.get(&table.schema)?.get(&table.table)
    }

    /// Check whether a table exists in the catalog.
    pub fn has_table(&self, table: &TableRef) -> bool {
        self.table_columns(table).is_some()
    }

    /// List every table in the catalog, sorted by qualified name.
    pub fn tables(&self) -> Vec<TableRef> {
        let mut tables: Vec<TableRef> = self
            .schemas
            .iter()
            .flat_map(|(schema, tables)| {
                tables
                    .keys()
                    .map(move |table| TableRef::new(schema.clone(), table.clone()))
            })
            .collect();
        tables.sort_by_key(|t| t.qualified());
        tables
    }

    /// Total number of catalogued columns.
    pub fn column_count(&self) -> usize {
        self.schemas
            .values()
            .flat_map(|tables| tables.values())
            .map(|columns| columns.len())
            .sum()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.column_count() == 0
    }
}

// ============================================================================
// Tests
// ============================================================================
