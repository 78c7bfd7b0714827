//! Lookup registry
//!
//! A static catalogue of the system's lookups: logical lookup names
//! mapped to (table, value column, label column) triples, the enum
//! catalogue (enum name -> ordered value list), the table -> label-column
//! guess dictionary used for foreign-key columns, and the
//! fully-qualified field -> enum direct mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabula_core::OptionItem;

/// Label column assumed when no dictionary entry matches a table.
pub const DEFAULT_LABEL_COLUMN: &str = "name";

// ============================================================================
// LookupSpec
// ============================================================================

/// Describes how to turn a raw value into a human label via a
/// secondary table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupSpec {
    /// Lookup table (possibly schema-qualified)
    pub table: String,

    /// Column holding the stored value
    pub value_column: String,

    /// Column holding the display label
    pub label_column: String,
}

impl LookupSpec {
    /// Create a new lookup spec
    pub fn new(
        table: impl Into<String>,
        value_column: impl Into<String>,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            value_column: value_column.into(),
            label_column: label_column.into(),
        }
    }

    /// Conventional id/name lookup for a table
    pub fn id_name(table: impl Into<String>) -> Self {
        Self::new(table, "id", DEFAULT_LABEL_COLUMN)
    }
}

// ============================================================================
// LookupRegistry
// ============================================================================

/// The static lookup/enum catalogue, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupRegistry {
    /// Logical lookup name -> spec
    #[serde(default)]
    lookups: HashMap<String, LookupSpec>,

    /// Enum name -> ordered list of allowed values
    #[serde(default)]
    enums: HashMap<String, Vec<String>>,

    /// Table name -> label column, for foreign-key label guessing
    #[serde(default)]
    label_columns: HashMap<String, String>,

    /// Fully-qualified `schema.table.field` -> enum name
    #[serde(default)]
    field_enums: HashMap<String, String>,
}

impl LookupRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ====================================================================
    // Builder methods (fixtures and tests)
    // ====================================================================

    /// Register a lookup under a logical name
    pub fn add_lookup(&mut self, name: impl Into<String>, spec: LookupSpec) {
        self.lookups.insert(name.into(), spec);
    }

    /// Register an enum's ordered value list
    pub fn add_enum(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.enums.insert(name.into(), values);
    }

    /// Register a table's label column
    pub fn add_label_column(&mut self, table: impl Into<String>, column: impl Into<String>) {
        self.label_columns.insert(table.into(), column.into());
    }

    /// Register a direct field -> enum mapping, keyed by
    /// `schema.table.field`
    pub fn add_field_enum(&mut self, qualified_field: impl Into<String>, enum_name: impl Into<String>) {
        self.field_enums.insert(qualified_field.into(), enum_name.into());
    }

    // ====================================================================
    // Queries
    // ====================================================================

    /// Look up a spec by logical name
    pub fn lookup(&self, name: &str) -> Option<&LookupSpec> {
        self.lookups.get(name)
    }

    /// Get an enum's ordered value list
    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    /// Get an enum's values as options (label echoes value)
    pub fn enum_options(&self, name: &str) -> Option<Vec<OptionItem>> {
        self.enums
            .get(name)
            .map(|values| values.iter().map(OptionItem::echo).collect())
    }

    /// Get the label column guessed for a table, falling back to
    /// [`DEFAULT_LABEL_COLUMN`]
    pub fn label_column_for(&self, table: &str) -> &str {
        self.label_columns
            .get(table)
            .map_or(DEFAULT_LABEL_COLUMN, String::as_str)
    }

    /// Get the enum directly mapped to a fully-qualified field
    pub fn field_enum(&self, schema: &str, table: &str, field: &str) -> Option<&str> {
        self.field_enums
            .get(&format!("{schema}.{table}.{field}"))
            .map(String::as_str)
    }

    /// Iterate all registered lookup names, sorted
    pub fn lookup_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.lookups.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterate all registered enum names, sorted
    pub fn enum_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.enums.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_registry() -> LookupRegistry {
        let mut registry = LookupRegistry::new();
        registry.add_lookup("schools", LookupSpec::id_name("schools"));
        registry.add_lookup(
            "mentors",
            LookupSpec::new("people", "id", "full_name"),
        );
        registry.add_enum(
            "loan_status",
            vec!["draft".into(), "open".into(), "repaid".into()],
        );
        registry.add_label_column("people", "full_name");
        registry.add_field_enum("public.people.role", "role_type");
        registry
    }

    #[test]
    fn test_lookup_queries() {
        let registry = sample_registry();
        assert_eq!(
            registry.lookup("schools"),
            Some(&LookupSpec::id_name("schools"))
        );
        assert!(registry.lookup("unknown").is_none());
        assert_eq!(registry.lookup_names(), vec!["mentors", "schools"]);
    }

    #[test]
    fn test_enum_queries() {
        let registry = sample_registry();
        assert_eq!(
            registry.enum_values("loan_status"),
            Some(&["draft".to_string(), "open".to_string(), "repaid".to_string()][..])
        );

        let options = registry.enum_options("loan_status").unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(options[1], OptionItem::echo("open"));
        assert!(registry.enum_options("unknown").is_none());
    }

    #[test]
    fn test_label_column_fallback() {
        let registry = sample_registry();
        assert_eq!(registry.label_column_for("people"), "full_name");
        assert_eq!(registry.label_column_for("schools"), DEFAULT_LABEL_COLUMN);
    }

    #[test]
    fn test_field_enum_mapping() {
        let registry = sample_registry();
        assert_eq!(
            registry.field_enum("public", "people", "role"),
            Some("role_type")
        );
        assert!(registry.field_enum("public", "people", "status").is_none());
    }
}
