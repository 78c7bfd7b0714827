//! Engine configuration
//!
//! Deployment-specific knobs the resolution engine consults at runtime:
//! formatting separators, currency keywords, bucket dictionaries for
//! attachment URL construction, and the parent-module foreign-key
//! dictionary used when loading child lists. Loadable from a TOML file;
//! every field has a usable default.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tabula_core::{EngineError, EngineResult};

// ============================================================================
// EngineConfig
// ============================================================================

/// Runtime configuration for the resolution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Separator between displayed array entries
    pub array_separator: String,

    /// Currency symbol prefix
    pub currency_symbol: String,

    /// Field-name substrings that mark a number field as currency
    pub currency_keywords: Vec<String>,

    /// chrono format string for date display
    pub date_format: String,

    /// Bucket used when neither dictionary matches
    pub default_bucket: String,

    /// Field name -> bucket, first choice for attachment fields
    pub field_buckets: HashMap<String, String>,

    /// Table name -> bucket, second choice for attachment fields
    pub table_buckets: HashMap<String, String>,

    /// Module name -> foreign-key column, for parent filtering and
    /// cross-table write keys. Modules absent here fall back to
    /// `{module}_id`.
    pub parent_columns: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            array_separator: ", ".to_string(),
            currency_symbol: "$".to_string(),
            currency_keywords: vec!["amount".to_string(), "cost".to_string()],
            date_format: "%b %-d, %Y".to_string(),
            default_bucket: "attachments".to_string(),
            field_buckets: HashMap::new(),
            table_buckets: HashMap::new(),
            parent_columns: HashMap::from([
                ("schools".to_string(), "school_id".to_string()),
                ("people".to_string(), "person_id".to_string()),
            ]),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(source: &str) -> EngineResult<Self> {
        toml::from_str(source).map_err(|e| EngineError::invalid_config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&source)
    }

    /// Foreign-key column for a parent module: dictionary entry or
    /// `{module}_id`.
    pub fn parent_column(&self, module: &str) -> String {
        self.parent_columns
            .get(module)
            .cloned()
            .unwrap_or_else(|| format!("{module}_id"))
    }

    /// Bucket for an attachment field: field dictionary, then table
    /// dictionary, then the default bucket.
    pub fn bucket_for(&self, field: &str, table: &str) -> &str {
        self.field_buckets
            .get(field)
            .or_else(|| self.table_buckets.get(table))
            .unwrap_or(&self.default_bucket)
    }

    /// Check whether a number field renders as currency.
    pub fn is_currency_field(&self, field: &str) -> bool {
        self.currency_keywords
            .iter()
            .any(|keyword| field.contains(keyword.as_str()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parent_column_dictionary_and_fallback() {
        let config = EngineConfig::default();
        assert_eq!(config.parent_column("schools"), "school_id");
        assert_eq!(config.parent_column("people"), "person_id");
        assert_eq!(config.parent_column("loans"), "loans_id");
    }

    #[test]
    fn test_bucket_resolution_order() {
        let mut config = EngineConfig::default();
        config
            .field_buckets
            .insert("photo_object_id".to_string(), "photos".to_string());
        config
            .table_buckets
            .insert("schools".to_string(), "school-media".to_string());

        assert_eq!(config.bucket_for("photo_object_id", "schools"), "photos");
        assert_eq!(config.bucket_for("logo_object_id", "schools"), "school-media");
        assert_eq!(config.bucket_for("logo_object_id", "loans"), "attachments");
    }

    #[test]
    fn test_currency_keywords() {
        let config = EngineConfig::default();
        assert!(config.is_currency_field("amount_issued"));
        assert!(config.is_currency_field("total_cost"));
        assert!(!config.is_currency_field("issue_date"));
    }

    #[test]
    fn test_from_toml_partial_overrides() {
        let config = EngineConfig::from_toml(
            r#"
            currency_symbol = "€"

            [parent_columns]
            cohorts = "cohort_id"
            "#,
        )
        .unwrap();

        assert_eq!(config.currency_symbol, "€");
        assert_eq!(config.parent_column("cohorts"), "cohort_id");
        // Defaults still apply to everything the file omits
        assert_eq!(config.array_separator, ", ");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml("not = [valid").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "currency_symbol = \"KSh \"\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.currency_symbol, "KSh ");

        let err = EngineConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, EngineError::FileRead { .. }));
    }
}
