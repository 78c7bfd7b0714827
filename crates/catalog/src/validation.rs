//! Catalog validation
//!
//! Structural checks over a loaded catalog bundle. Hard errors mark
//! configuration the engine cannot serve (a preset with no columns);
//! warnings mark references that degrade at runtime instead of failing
//! (an unknown read source is legal — virtual sources exist — but worth
//! surfacing).

use crate::{CatalogBundle, ColumnEntry, ViewPreset};
use std::collections::HashSet;
use tabula_core::{EngineError, EngineResult, TableRef};

// ============================================================================
// ValidationIssue
// ============================================================================

/// Issue codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    /// Preset has an empty column list
    EmptyColumns,
    /// Preset page size is zero
    ZeroLimit,
    /// Two toggles share a name
    DuplicateToggle,
    /// Preset reads from a table absent from the schema catalog
    UnknownReadSource,
    /// Ordering references a column absent from the read source
    UnknownOrderColumn,
    /// Override names a lookup absent from the registry
    DanglingLookup,
    /// Column carries an enum reference absent from the registry
    DanglingEnum,
}

/// One validation finding.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Issue code
    pub code: IssueCode,

    /// Human-readable message
    pub message: String,

    /// Path to the problematic element (e.g. `presets.loans_table.columns`)
    pub path: String,
}

impl ValidationIssue {
    fn new(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
        }
    }
}

// ============================================================================
// ValidationReport
// ============================================================================

/// Accumulated result of validating a bundle.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Fatal findings
    pub errors: Vec<ValidationIssue>,

    /// Non-fatal findings
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty (passing) report
    pub fn ok() -> Self {
        Self::default()
    }

    /// Add a fatal finding
    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Add a non-fatal finding
    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Check if any fatal finding was recorded
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if any non-fatal finding was recorded
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Convert to a result, failing on the first recorded error
    pub fn to_result(&self) -> EngineResult<()> {
        if self.has_errors() {
            let msg = self
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.path, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            Err(EngineError::validation(msg))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Bundle validation
// ============================================================================

/// Validate a loaded catalog bundle.
pub fn validate_bundle(bundle: &CatalogBundle) -> ValidationReport {
    let mut report = ValidationReport::ok();

    for preset in bundle.presets.iter() {
        report.merge(validate_preset(bundle, preset));
    }

    validate_schema_enums(bundle, &mut report);

    report
}

fn validate_preset(bundle: &CatalogBundle, preset: &ViewPreset) -> ValidationReport {
    let mut report = ValidationReport::ok();
    let path = format!("presets.{}", preset.id);

    if preset.columns.is_empty() {
        report.add_error(ValidationIssue::new(
            IssueCode::EmptyColumns,
            format!("{path}.columns"),
            "preset declares no columns",
        ));
    }

    if preset.limit == 0 {
        report.add_error(ValidationIssue::new(
            IssueCode::ZeroLimit,
            format!("{path}.limit"),
            "page size must be at least 1",
        ));
    }

    let mut toggle_names: HashSet<&str> = HashSet::new();
    for toggle in &preset.toggles {
        if !toggle_names.insert(toggle.name.as_str()) {
            report.add_error(ValidationIssue::new(
                IssueCode::DuplicateToggle,
                format!("{path}.toggles.{}", toggle.name),
                "toggle name declared twice",
            ));
        }
    }

    let source = TableRef::parse(&preset.read_source);
    let columns = bundle.schema.table_columns(&source);

    if columns.is_none() {
        report.add_warning(ValidationIssue::new(
            IssueCode::UnknownReadSource,
            format!("{path}.read_source"),
            format!("table '{}' is not in the schema catalog", preset.read_source),
        ));
    }

    if let Some(columns) = columns {
        for order in &preset.order_by {
            if !columns.contains_key(&order.column) {
                report.add_warning(ValidationIssue::new(
                    IssueCode::UnknownOrderColumn,
                    format!("{path}.order_by.{}", order.column),
                    format!(
                        "ordering column '{}' is not in '{}'",
                        order.column, preset.read_source
                    ),
                ));
            }
        }
    }

    for entry in &preset.columns {
        if let ColumnEntry::Spec(spec) = entry {
            if let Some(crate::LookupRef::Named(name)) = &spec.overrides.lookup {
                if bundle.lookups.lookup(name).is_none() {
                    report.add_warning(ValidationIssue::new(
                        IssueCode::DanglingLookup,
                        format!("{path}.columns.{}", spec.field),
                        format!("lookup '{name}' is not registered"),
                    ));
                }
            }
            if let Some(enum_name) = &spec.overrides.enum_name {
                if bundle.lookups.enum_values(enum_name).is_none() {
                    report.add_warning(ValidationIssue::new(
                        IssueCode::DanglingEnum,
                        format!("{path}.columns.{}", spec.field),
                        format!("enum '{enum_name}' is not registered"),
                    ));
                }
            }
        }
    }

    report
}

fn validate_schema_enums(bundle: &CatalogBundle, report: &mut ValidationReport) {
    for table in bundle.schema.tables() {
        let Some(columns) = bundle.schema.table_columns(&table) else {
            continue;
        };
        for (name, column) in columns {
            if let Some(enum_ref) = &column.enum_ref {
                if bundle.lookups.enum_values(enum_ref).is_none() {
                    report.add_warning(ValidationIssue::new(
                        IssueCode::DanglingEnum,
                        format!("schema.{}.{}", table.qualified(), name),
                        format!("enum '{enum_ref}' is not registered"),
                    ));
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnInfo, ColumnSpec, FieldOverride, LookupRegistry, PresetCatalog, SchemaCatalog, Toggle};
    use tabula_core::{Filter, OrderBy, SchemaBaseType};

    fn bundle_with(preset: ViewPreset) -> CatalogBundle {
        let mut schema = SchemaCatalog::new();
        let loans = TableRef::parse("loans");
        schema.add_column(&loans, "id", ColumnInfo::new(SchemaBaseType::String));
        schema.add_column(&loans, "issue_date", ColumnInfo::new(SchemaBaseType::Date));

        let mut presets = PresetCatalog::new();
        presets.insert(preset);

        CatalogBundle::new(schema, LookupRegistry::new(), presets)
    }

    #[test]
    fn test_valid_preset_passes() {
        let preset = ViewPreset::new("loans_table", "Loans", "loans")
            .with_column("id")
            .with_order(OrderBy::desc("issue_date"));
        let report = validate_bundle(&bundle_with(preset));
        assert!(!report.has_errors());
        assert!(!report.has_warnings());
        assert!(report.to_result().is_ok());
    }

    #[test]
    fn test_empty_columns_is_error() {
        let preset = ViewPreset::new("empty", "Empty", "loans");
        let report = validate_bundle(&bundle_with(preset));
        assert!(report.has_errors());
        assert_eq!(report.errors[0].code, IssueCode::EmptyColumns);
        assert!(report.to_result().is_err());
    }

    #[test]
    fn test_unknown_read_source_is_warning() {
        let preset = ViewPreset::new("virtual", "Virtual", "not_a_table").with_column("id");
        let report = validate_bundle(&bundle_with(preset));
        assert!(!report.has_errors());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.code == IssueCode::UnknownReadSource));
    }

    #[test]
    fn test_unknown_order_column_is_warning() {
        let preset = ViewPreset::new("loans_table", "Loans", "loans")
            .with_column("id")
            .with_order(OrderBy::asc("missing_column"));
        let report = validate_bundle(&bundle_with(preset));
        assert!(report
            .warnings
            .iter()
            .any(|w| w.code == IssueCode::UnknownOrderColumn));
    }

    #[test]
    fn test_duplicate_toggle_is_error() {
        let toggle = Toggle {
            name: "open_only".to_string(),
            label: "Open only".to_string(),
            filter: Filter::eq("status", "open"),
            default_on: false,
        };
        let preset = ViewPreset::new("loans_table", "Loans", "loans")
            .with_column("id")
            .with_toggle(toggle.clone())
            .with_toggle(toggle);
        let report = validate_bundle(&bundle_with(preset));
        assert!(report
            .errors
            .iter()
            .any(|e| e.code == IssueCode::DuplicateToggle));
    }

    #[test]
    fn test_dangling_lookup_is_warning() {
        let preset = ViewPreset::new("loans_table", "Loans", "loans").with_column_spec(
            ColumnSpec::new("school_id")
                .with_overrides(FieldOverride::new().with_lookup("nowhere")),
        );
        let report = validate_bundle(&bundle_with(preset));
        assert!(report
            .warnings
            .iter()
            .any(|w| w.code == IssueCode::DanglingLookup));
    }

    #[test]
    fn test_dangling_schema_enum_is_warning() {
        let mut bundle = bundle_with(ViewPreset::new("loans_table", "Loans", "loans").with_column("id"));
        bundle.schema.add_column(
            &TableRef::parse("loans"),
            "status",
            ColumnInfo::new(SchemaBaseType::Enum).with_enum("loan_status"),
        );
        let report = validate_bundle(&bundle);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.code == IssueCode::DanglingEnum));
    }
}
