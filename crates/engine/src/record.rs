//! Renderable entity records
//!
//! The loader's output: one record per row, carrying both the raw
//! values as loaded (`original`) and the per-field renderable views.
//! Records are constructed fresh on every load and never mutated in
//! place; edits live in a draft row that is diffed against `original`
//! before any write is issued.

use std::collections::BTreeMap;
use std::sync::Arc;
use tabula_core::{FieldType, OptionItem, Row, TableRef};

// ============================================================================
// FieldView
// ============================================================================

/// One field of a record, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    /// Raw value as loaded, passed through unchanged
    pub raw: serde_json::Value,

    /// Display string after transformation
    pub display: String,

    /// Whether edits are accepted
    pub editable: bool,

    /// Resolved type
    pub field_type: FieldType,

    /// Option set for selection fields, shared with the option cache.
    /// Treat as immutable; deep-copy before mutating labels.
    pub options: Option<Arc<Vec<OptionItem>>>,
}

// ============================================================================
// EntityRecord
// ============================================================================

/// A loaded entity, transformed against its field descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    /// Primary key value, as text
    pub id: String,

    /// Table the record was read from
    pub table: TableRef,

    /// Raw row exactly as loaded
    pub original: Row,

    /// Renderable views keyed by field name
    pub fields: BTreeMap<String, FieldView>,
}

impl EntityRecord {
    /// Display string for a field; empty when absent.
    pub fn display(&self, field: &str) -> &str {
        self.fields.get(field).map_or("", |f| f.display.as_str())
    }

    /// Raw value for a field, from the original row.
    pub fn raw(&self, field: &str) -> Option<&serde_json::Value> {
        self.original.get(field)
    }

    /// Compute the changed-field set of a draft against the original
    /// row. Fields equal to their original value are dropped, so a
    /// no-edit save diffs to nothing.
    pub fn diff(&self, draft: &Row) -> Row {
        draft
            .iter()
            .filter(|(field, value)| self.original.get(*field) != Some(value))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }
}

// ============================================================================
// ListPage
// ============================================================================

/// One page of a list load.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    /// Transformed records, in store order
    pub records: Vec<EntityRecord>,

    /// Total available count, when requested. Independent of the page
    /// size: the limit is a page size, not a count cap.
    pub total: Option<u64>,
}

// ============================================================================
// Tests
// ============================================================================
