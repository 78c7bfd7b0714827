//! Catalog bundle (de)serialization
//!
//! The three static artifacts — schema catalog, lookup registry, and
//! preset catalog — are shipped together as one versioned JSON bundle,
//! or as separate files discovered by the CLI. This module owns the
//! file format and its version migration hook.

use crate::{LookupRegistry, PresetCatalog, SchemaCatalog};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tabula_core::{EngineError, EngineResult};

// ============================================================================
// Constants
// ============================================================================

/// Current bundle format version
pub const CATALOG_VERSION: u32 = 1;

/// File extension for catalog bundles
pub const BUNDLE_EXTENSION: &str = "json";

// ============================================================================
// CatalogBundle
// ============================================================================

/// The combined static input artifacts, with version information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogBundle {
    /// Bundle format version for migration purposes
    #[serde(default = "current_version")]
    pub catalog_version: u32,

    /// Generated schema metadata
    #[serde(default)]
    pub schema: SchemaCatalog,

    /// Lookup/enum registry
    #[serde(default)]
    pub lookups: LookupRegistry,

    /// View presets
    #[serde(default)]
    pub presets: PresetCatalog,
}

fn current_version() -> u32 {
    CATALOG_VERSION
}

impl CatalogBundle {
    /// Assemble a bundle from its parts
    pub fn new(schema: SchemaCatalog, lookups: LookupRegistry, presets: PresetCatalog) -> Self {
        Self {
            catalog_version: CATALOG_VERSION,
            schema,
            lookups,
            presets,
        }
    }

    /// Check if the bundle predates the current format
    pub fn needs_migration(&self) -> bool {
        self.catalog_version < CATALOG_VERSION
    }

    /// Migrate to the latest format version
    pub fn migrate(&mut self) -> EngineResult<()> {
        while self.catalog_version < CATALOG_VERSION {
            self.migrate_one_version()?;
        }
        if self.catalog_version > CATALOG_VERSION {
            return Err(EngineError::CatalogVersionMismatch {
                expected: CATALOG_VERSION,
                found: self.catalog_version,
            });
        }
        Ok(())
    }

    fn migrate_one_version(&mut self) -> EngineResult<()> {
        match self.catalog_version {
            // Migration steps land here as the format evolves
            _ => {
                self.catalog_version = CATALOG_VERSION;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Save Functions
// ============================================================================

/// Save a bundle to a file as pretty-printed JSON.
pub fn save_bundle(bundle: &CatalogBundle, path: impl AsRef<Path>) -> EngineResult<()> {
    let path = path.as_ref();

    let json = serde_json::to_string_pretty(bundle).map_err(|e| EngineError::FileWrite {
        path: path.to_path_buf(),
        message: format!("Failed to serialize catalog bundle: {e}"),
    })?;

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::FileWrite {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
    }

    std::fs::write(path, json).map_err(|e| EngineError::FileWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

// ============================================================================
// Load Functions
// ============================================================================

/// Load a bundle from a file, migrating old formats.
pub fn load_bundle(path: impl AsRef<Path>) -> EngineResult<CatalogBundle> {
    let path = path.as_ref();

    let json = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    load_bundle_from_str(&json).map_err(|e| match e {
        EngineError::JsonSerialization(je) => EngineError::FileRead {
            path: path.to_path_buf(),
            message: je.to_string(),
        },
        other => other,
    })
}

/// Load a bundle from a JSON string, migrating old formats.
pub fn load_bundle_from_str(json: &str) -> EngineResult<CatalogBundle> {
    let mut bundle: CatalogBundle = serde_json::from_str(json)?;
    bundle.schema.finalize();
    bundle.presets.finalize();
    bundle.migrate()?;
    Ok(bundle)
}

/// Load a standalone schema catalog file.
pub fn load_schema(path: impl AsRef<Path>) -> EngineResult<SchemaCatalog> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    SchemaCatalog::from_json(&json).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a standalone lookup registry file.
pub fn load_lookups(path: impl AsRef<Path>) -> EngineResult<LookupRegistry> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&json).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a standalone preset catalog file.
pub fn load_presets(path: impl AsRef<Path>) -> EngineResult<PresetCatalog> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    PresetCatalog::from_json(&json).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnInfo, LookupSpec, ViewPreset};
    use tabula_core::{SchemaBaseType, TableRef};

    fn sample_bundle() -> CatalogBundle {
        let mut schema = SchemaCatalog::new();
        schema.add_column(
            &TableRef::parse("loans"),
            "amount_issued",
            ColumnInfo::new(SchemaBaseType::Number),
        );

        let mut lookups = LookupRegistry::new();
        lookups.add_lookup("schools", LookupSpec::id_name("schools"));

        let mut presets = PresetCatalog::new();
        presets.insert(ViewPreset::new("loans_table", "Loans", "loans").with_column("amount_issued"));

        CatalogBundle::new(schema, lookups, presets)
    }

    #[test]
    fn test_bundle_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let bundle = sample_bundle();
        save_bundle(&bundle, &path).unwrap();

        let loaded = load_bundle(&path).unwrap();
        assert_eq!(loaded.catalog_version, CATALOG_VERSION);
        assert_eq!(loaded.schema.column_count(), 1);
        assert!(loaded.lookups.lookup("schools").is_some());
        assert_eq!(loaded.presets.get("loans_table").unwrap().title, "Loans");
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = load_bundle("/nonexistent/catalog.json").unwrap_err();
        assert!(matches!(err, EngineError::FileRead { .. }));
    }

    #[test]
    fn test_old_version_migrates() {
        let json = r#"{"catalog_version": 0, "schema": {}, "lookups": {}, "presets": {}}"#;
        let bundle = load_bundle_from_str(json).unwrap();
        assert_eq!(bundle.catalog_version, CATALOG_VERSION);
        assert!(!bundle.needs_migration());
    }

    #[test]
    fn test_future_version_rejected() {
        let json = format!(
            r#"{{"catalog_version": {}, "schema": {{}}, "lookups": {{}}, "presets": {{}}}}"#,
            CATALOG_VERSION + 1
        );
        let err = load_bundle_from_str(&json).unwrap_err();
        assert!(matches!(err, EngineError::CatalogVersionMismatch { .. }));
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let bundle = load_bundle_from_str(r#"{"catalog_version": 1}"#).unwrap();
        assert!(bundle.schema.is_empty());
        assert!(bundle.presets.is_empty());
    }
}
