//! View/preset resolution
//!
//! Resolves a named preset into a renderable column set by running the
//! field resolver over every column entry and layering the preset's
//! presentation hints on top. Resolution is lazy and memoized for the
//! process lifetime; column order always equals declaration order,
//! which the rendering protocol depends on.

use crate::resolver::{FieldDescriptor, FieldResolver};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tabula_catalog::{ListSlot, PresetCatalog, RowAction, TableAction, Toggle};
use tabula_core::{EngineError, EngineResult, Filter, OrderBy, TableRef};

// ============================================================================
// ResolvedColumn
// ============================================================================

/// A fully resolved column: field descriptor plus view-specific
/// presentation hints.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    /// The resolved field descriptor
    pub descriptor: FieldDescriptor,

    /// List-layout slot assignment
    pub slot: Option<ListSlot>,

    /// Render as a link to a sibling field's value
    pub link_to: Option<String>,

    /// Maximum displayed array entries (column hint, else descriptor)
    pub max_entries: Option<u32>,
}

// ============================================================================
// ResolvedView
// ============================================================================

/// A preset resolved into renderable form.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedView {
    /// Preset id
    pub id: String,

    /// View title
    pub title: String,

    /// Parsed read source
    pub source: TableRef,

    /// Base filter, always applied
    pub read_filter: Vec<Filter>,

    /// Ordering terms
    pub order_by: Vec<OrderBy>,

    /// Page size
    pub limit: u32,

    /// Columns in declaration order
    pub columns: Vec<ResolvedColumn>,

    /// Per-row actions
    pub row_actions: Vec<RowAction>,

    /// Table-level actions
    pub table_actions: Vec<TableAction>,

    /// Filter toggles
    pub toggles: Vec<Toggle>,

    /// Module context the view was resolved under, used to derive the
    /// parent foreign-key column for child lists
    pub context_module: Option<String>,
}

impl ResolvedView {
    /// Find a column by field name
    pub fn column(&self, field: &str) -> Option<&ResolvedColumn> {
        self.columns.iter().find(|c| c.descriptor.field == field)
    }

    /// Field descriptors keyed by field name, for write-back planning
    pub fn descriptors(&self) -> HashMap<String, FieldDescriptor> {
        self.columns
            .iter()
            .map(|c| (c.descriptor.field.clone(), c.descriptor.clone()))
            .collect()
    }
}

// ============================================================================
// ViewResolver
// ============================================================================

/// Resolves presets, memoizing the result per (preset, module) for the
/// process lifetime. Safe to share across concurrent loads.
#[derive(Debug)]
pub struct ViewResolver {
    presets: Arc<PresetCatalog>,
    fields: FieldResolver,
    cache: Mutex<HashMap<(String, Option<String>), Arc<ResolvedView>>>,
}

impl ViewResolver {
    /// Create a resolver over the preset catalog
    pub fn new(presets: Arc<PresetCatalog>, fields: FieldResolver) -> Self {
        Self {
            presets,
            fields,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a preset by id.
    pub fn resolve(
        &self,
        preset_id: &str,
        module: Option<&str>,
    ) -> EngineResult<Arc<ResolvedView>> {
        let key = (preset_id.to_string(), module.map(str::to_string));

        if let Some(view) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(view));
        }

        let preset = self
            .presets
            .get(preset_id)
            .ok_or_else(|| EngineError::PresetNotFound(preset_id.to_string()))?;

        let source = TableRef::parse(&preset.read_source);

        let columns: Vec<ResolvedColumn> = preset
            .columns
            .iter()
            .map(|entry| {
                let spec = entry.to_spec();
                let descriptor = self.fields.resolve(&source, &spec.field, Some(&spec.overrides));
                let max_entries = spec.max_entries.or(descriptor.max_array_entries);
                ResolvedColumn {
                    descriptor,
                    slot: spec.slot,
                    link_to: spec.link_to,
                    max_entries,
                }
            })
            .collect();

        let view = Arc::new(ResolvedView {
            id: preset.id.clone(),
            title: preset.title.clone(),
            source,
            read_filter: preset.read_filter.clone(),
            order_by: preset.order_by.clone(),
            limit: preset.limit,
            columns,
            row_actions: preset.row_actions.clone(),
            table_actions: preset.table_actions.clone(),
            toggles: preset.toggles.clone(),
            context_module: module.map(str::to_string),
        });

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&view));

        Ok(view)
    }

    /// Drop every memoized view (catalog regeneration).
    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_catalog::{
        ColumnInfo, ColumnSpec, FieldOverride, LookupRegistry, SchemaCatalog, ViewPreset,
    };
    use tabula_core::SchemaBaseType;

    fn fixture() -> ViewResolver {
        let mut schema = SchemaCatalog::new();
        let loans = TableRef::parse("loans");
        schema.add_column(&loans, "id", ColumnInfo::new(SchemaBaseType::String));
        schema.add_column(&loans, "issue_date", ColumnInfo::new(SchemaBaseType::Date));
        schema.add_column(
            &loans,
            "amount_issued",
            ColumnInfo::new(SchemaBaseType::Number),
        );
        schema.add_column(
            &loans,
            "borrowers",
            ColumnInfo::new(SchemaBaseType::String).array(),
        );

        let mut presets = PresetCatalog::new();
        presets.insert(
            ViewPreset::new("loans_table", "Loans", "loans")
                .with_column("issue_date")
                .with_column_spec(
                    ColumnSpec::new("amount_issued")
                        .with_overrides(FieldOverride::new().with_label("Issued"))
                        .with_slot(ListSlot::Badge),
                )
                .with_column_spec(ColumnSpec::new("borrowers").with_max_entries(2))
                .with_order(tabula_core::OrderBy::desc("issue_date")),
        );

        let fields = FieldResolver::new(Arc::new(schema), Arc::new(LookupRegistry::new()));
        ViewResolver::new(Arc::new(presets), fields)
    }

    #[test]
    fn test_columns_preserve_declaration_order() {
        let resolver = fixture();
        let view = resolver.resolve("loans_table", None).unwrap();

        let order: Vec<&str> = view
            .columns
            .iter()
            .map(|c| c.descriptor.field.as_str())
            .collect();
        assert_eq!(order, vec!["issue_date", "amount_issued", "borrowers"]);
    }

    #[test]
    fn test_column_hints_layered_on_descriptor() {
        let resolver = fixture();
        let view = resolver.resolve("loans_table", None).unwrap();

        let amount = view.column("amount_issued").unwrap();
        assert_eq!(amount.descriptor.label, "Issued");
        assert_eq!(amount.slot, Some(ListSlot::Badge));

        let borrowers = view.column("borrowers").unwrap();
        assert_eq!(borrowers.max_entries, Some(2));
    }

    #[test]
    fn test_resolution_is_memoized() {
        let resolver = fixture();
        let first = resolver.resolve("loans_table", None).unwrap();
        let second = resolver.resolve("loans_table", None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        resolver.clear_cache();
        let third = resolver.resolve("loans_table", None).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn test_module_context_is_part_of_the_key() {
        let resolver = fixture();
        let bare = resolver.resolve("loans_table", None).unwrap();
        let scoped = resolver.resolve("loans_table", Some("schools")).unwrap();

        assert!(!Arc::ptr_eq(&bare, &scoped));
        assert_eq!(scoped.context_module.as_deref(), Some("schools"));
    }

    #[test]
    fn test_unknown_preset_is_an_error() {
        let resolver = fixture();
        let err = resolver.resolve("nope", None).unwrap_err();
        assert!(matches!(err, EngineError::PresetNotFound(_)));
    }
}
