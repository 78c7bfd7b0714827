//! # Tabula Catalog
//!
//! Static input artifacts for the Tabula engine.
//!
//! Everything in this crate is declarative configuration, loaded once
//! at startup and never mutated:
//!
//! - **SchemaCatalog**: generated `schema -> table -> column` metadata
//! - **LookupRegistry**: lookup specs, the enum catalogue, the
//!   label-column dictionary, and direct field -> enum mappings
//! - **FieldOverride**: hand-authored per-field configuration
//! - **ViewPreset**: named list/table view specifications
//! - **CatalogBundle**: the versioned on-disk container for all of the
//!   above, plus validation
//!

pub mod lookup;
pub mod overrides;
pub mod preset;
pub mod schema;
pub mod serialization;
pub mod validation;

// Re-export commonly used types at crate root
pub use lookup::{DEFAULT_LABEL_COLUMN, LookupRegistry, LookupSpec};
pub use overrides::{FieldOverride, LookupRef, VisibilityRule};
pub use preset::{
    ColumnEntry, ColumnSpec, DEFAULT_PAGE_SIZE, ListSlot, PresetCatalog, RowAction, TableAction,
    Toggle, ViewPreset,
};
pub use schema::{ColumnInfo, ForeignKeyRef, SchemaCatalog};
pub use serialization::{
    BUNDLE_EXTENSION, CATALOG_VERSION, CatalogBundle, load_bundle, load_bundle_from_str,
    load_lookups, load_presets, load_schema, save_bundle,
};
pub use validation::{IssueCode, ValidationIssue, ValidationReport, validate_bundle};

// Re-export core types that are commonly used with catalog data
pub use tabula_core::{
    EngineError, EngineResult, FieldType, Filter, OptionItem, OrderBy, SchemaBaseType, TableRef,
    UpdateMode,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_version() {
        assert_eq!(CATALOG_VERSION, 1);
    }

    #[test]
    fn test_default_page_size() {
        assert_eq!(DEFAULT_PAGE_SIZE, 50);
    }
}
