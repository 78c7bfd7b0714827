//! Authored field overrides
//!
//! Hand-written, per-field configuration layered over the generated
//! schema metadata. Every attribute is optional; anything an override
//! supplies wins over the inferred value, and anything it omits falls
//! through to inference.

use crate::lookup::LookupSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula_core::{FieldType, OptionItem, UpdateMode};

// ============================================================================
// LookupRef
// ============================================================================

/// An override's lookup reference: either the logical name of a
/// registered lookup, or a full inline spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LookupRef {
    /// Name registered in the lookup registry
    Named(String),
    /// Inline (table, value column, label column) triple
    Spec(LookupSpec),
}

// ============================================================================
// VisibilityRule
// ============================================================================

/// A simple visibility predicate: show the field only when a sibling
/// field holds the given value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityRule {
    /// Sibling field inspected
    pub field: String,

    /// Value the sibling must hold
    pub equals: Value,
}

impl VisibilityRule {
    /// Evaluate the rule against a raw row
    pub fn matches(&self, row: &tabula_core::Row) -> bool {
        row.get(&self.field).map_or(false, |v| *v == self.equals)
    }
}

// ============================================================================
// FieldOverride
// ============================================================================

/// Hand-authored configuration for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FieldOverride {
    /// Display label
    pub label: Option<String>,

    /// Explicit resolved type
    pub field_type: Option<FieldType>,

    /// Explicit array flag
    pub array: Option<bool>,

    /// Render as a multi-line editor
    pub multiline: Option<bool>,

    /// Column width hint, in pixels
    pub width: Option<u32>,

    /// Lookup reference (registered name or inline spec)
    pub lookup: Option<LookupRef>,

    /// Explicit enum name from the enum catalogue
    pub enum_name: Option<String>,

    /// Explicit option list, bypassing lookups and enums entirely
    pub options: Option<Vec<OptionItem>>,

    /// Explicit editability flag
    pub editable: Option<bool>,

    /// Whether a value is required on save
    pub required: Option<bool>,

    /// Maximum text length
    pub max_length: Option<u32>,

    /// Maximum displayed array entries before truncation
    pub max_array_entries: Option<u32>,

    /// Table this field is read from and written to instead of the
    /// entity's own table (cross-table field)
    pub write_table: Option<String>,

    /// Column on `write_table` keyed by the entity id; derived from the
    /// entity table when absent
    pub write_key_column: Option<String>,

    /// Storage bucket for attachment fields
    pub bucket: Option<String>,

    /// Treat the attachment as an image
    pub is_image: Option<bool>,

    /// Visibility predicate
    pub visible_when: Option<VisibilityRule>,

    /// Whether the field participates in updates vs. only creation
    pub update_mode: UpdateMode,
}

impl FieldOverride {
    /// Create an empty override (everything falls through to inference)
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the override supplies nothing at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    // ====================================================================
    // Builder methods
    // ====================================================================

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the explicit type
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Reference a registered lookup by name
    pub fn with_lookup(mut self, name: impl Into<String>) -> Self {
        self.lookup = Some(LookupRef::Named(name.into()));
        self
    }

    /// Attach an inline lookup spec
    pub fn with_lookup_spec(mut self, spec: LookupSpec) -> Self {
        self.lookup = Some(LookupRef::Spec(spec));
        self
    }

    /// Reference an enum from the enum catalogue
    pub fn with_enum(mut self, name: impl Into<String>) -> Self {
        self.enum_name = Some(name.into());
        self
    }

    /// Supply an explicit option list
    pub fn with_options(mut self, options: Vec<OptionItem>) -> Self {
        self.options = Some(options);
        self
    }

    /// Redirect reads and writes to another table
    pub fn with_write_table(mut self, table: impl Into<String>) -> Self {
        self.write_table = Some(table.into());
        self
    }

    /// Cap the displayed array entries
    pub fn with_max_array_entries(mut self, max: u32) -> Self {
        self.max_array_entries = Some(max);
        self
    }

    /// Mark the field read-only
    pub fn read_only(mut self) -> Self {
        self.editable = Some(false);
        self
    }

    /// Only write the field when creating a new entity
    pub fn new_only(mut self) -> Self {
        self.update_mode = UpdateMode::NewOnly;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_default_is_empty() {
        let override_ = FieldOverride::new();
        assert!(override_.is_empty());
        assert_eq!(override_.update_mode, UpdateMode::Yes);

        let labeled = FieldOverride::new().with_label("Mentor");
        assert!(!labeled.is_empty());
    }

    #[test]
    fn test_lookup_ref_deserializes_name_or_spec() {
        let named: LookupRef = serde_json::from_value(json!("schools")).unwrap();
        assert_eq!(named, LookupRef::Named("schools".to_string()));

        let spec: LookupRef = serde_json::from_value(json!({
            "table": "people",
            "value_column": "id",
            "label_column": "full_name"
        }))
        .unwrap();
        assert_eq!(
            spec,
            LookupRef::Spec(LookupSpec::new("people", "id", "full_name"))
        );
    }

    #[test]
    fn test_override_deserializes_sparse_json() {
        let override_: FieldOverride = serde_json::from_value(json!({
            "label": "Role",
            "write_table": "people_roles_associations",
            "update_mode": "new_only"
        }))
        .unwrap();

        assert_eq!(override_.label.as_deref(), Some("Role"));
        assert_eq!(
            override_.write_table.as_deref(),
            Some("people_roles_associations")
        );
        assert_eq!(override_.update_mode, UpdateMode::NewOnly);
        assert!(override_.field_type.is_none());
        assert!(override_.editable.is_none());
    }

    #[test]
    fn test_visibility_rule() {
        let rule = VisibilityRule {
            field: "status".to_string(),
            equals: json!("open"),
        };

        let mut row = tabula_core::Row::new();
        row.insert("status".to_string(), json!("open"));
        assert!(rule.matches(&row));

        row.insert("status".to_string(), json!("repaid"));
        assert!(!rule.matches(&row));

        row.remove("status");
        assert!(!rule.matches(&row));
    }
}
