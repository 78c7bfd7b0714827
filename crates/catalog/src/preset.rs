//! View presets
//!
//! A preset is a named, static specification of a list or table view:
//! its title, read source, filters, ordering, column list, actions,
//! and toggles. Presets are declarative configuration; the engine
//! resolves them lazily into renderable column sets.

use crate::overrides::FieldOverride;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabula_core::{Filter, OrderBy};

/// Page size applied when a preset does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

// ============================================================================
// ListSlot
// ============================================================================

/// Layout slot a column occupies in card/list rendering.
///
/// The rendering protocol itself is owned by the excluded rendering
/// layer; the engine only carries the assignment through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSlot {
    Title,
    Subtitle,
    Body,
    Badge,
    Footer,
    Attachment,
}

// ============================================================================
// Actions
// ============================================================================

/// Per-row actions offered by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Edit,
    Delete,
    Archive,
    Restore,
}

/// Table-level actions offered by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableAction {
    Create,
    Export,
    Refresh,
}

// ============================================================================
// Toggle
// ============================================================================

/// A user-facing filter toggle. Its filter is applied only while the
/// toggle is active; `default_on` decides the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toggle {
    /// Stable identifier
    pub name: String,

    /// Display label
    pub label: String,

    /// Filter applied while active
    pub filter: Filter,

    /// Initial state
    #[serde(default)]
    pub default_on: bool,
}

// ============================================================================
// Columns
// ============================================================================

/// Per-column configuration inside a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Field the column renders
    pub field: String,

    /// Override hints merged into field resolution
    #[serde(default)]
    pub overrides: FieldOverride,

    /// List-layout slot assignment
    #[serde(default)]
    pub slot: Option<ListSlot>,

    /// Render as a link to a sibling field's value
    #[serde(default)]
    pub link_to: Option<String>,

    /// Maximum displayed array entries for this column
    #[serde(default)]
    pub max_entries: Option<u32>,
}

impl ColumnSpec {
    /// Create a bare column for a field
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            overrides: FieldOverride::default(),
            slot: None,
            link_to: None,
            max_entries: None,
        }
    }

    /// Attach override hints
    pub fn with_overrides(mut self, overrides: FieldOverride) -> Self {
        self.overrides = overrides;
        self
    }

    /// Assign a list-layout slot
    pub fn with_slot(mut self, slot: ListSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Cap displayed array entries
    pub fn with_max_entries(mut self, max: u32) -> Self {
        self.max_entries = Some(max);
        self
    }
}

/// A preset column entry: either a bare field name or a full spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnEntry {
    /// Bare field name, all defaults
    Name(String),
    /// Full per-column specification
    Spec(ColumnSpec),
}

impl ColumnEntry {
    /// The field this entry renders
    pub fn field_name(&self) -> &str {
        match self {
            ColumnEntry::Name(name) => name,
            ColumnEntry::Spec(spec) => &spec.field,
        }
    }

    /// Expand to a full column spec
    pub fn to_spec(&self) -> ColumnSpec {
        match self {
            ColumnEntry::Name(name) => ColumnSpec::new(name.clone()),
            ColumnEntry::Spec(spec) => spec.clone(),
        }
    }
}

// ============================================================================
// ViewPreset
// ============================================================================

/// A named, static view specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPreset {
    /// Stable identifier (filled from the catalog key when absent)
    #[serde(default)]
    pub id: String,

    /// View title
    pub title: String,

    /// Table (possibly schema-qualified) rows are read from
    pub read_source: String,

    /// Base filter, always applied
    #[serde(default)]
    pub read_filter: Vec<Filter>,

    /// Ordering terms
    #[serde(default)]
    pub order_by: Vec<OrderBy>,

    /// Page size
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Columns, in declaration order. Order is load-bearing for the
    /// title/subtitle/body/badge/footer rendering protocol.
    pub columns: Vec<ColumnEntry>,

    /// Per-row actions
    #[serde(default)]
    pub row_actions: Vec<RowAction>,

    /// Table-level actions
    #[serde(default)]
    pub table_actions: Vec<TableAction>,

    /// Filter toggles
    #[serde(default)]
    pub toggles: Vec<Toggle>,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl ViewPreset {
    /// Create a minimal preset over a read source
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        read_source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            read_source: read_source.into(),
            read_filter: Vec::new(),
            order_by: Vec::new(),
            limit: DEFAULT_PAGE_SIZE,
            columns: Vec::new(),
            row_actions: Vec::new(),
            table_actions: Vec::new(),
            toggles: Vec::new(),
        }
    }

    /// Append a bare column
    pub fn with_column(mut self, field: impl Into<String>) -> Self {
        self.columns.push(ColumnEntry::Name(field.into()));
        self
    }

    /// Append a full column spec
    pub fn with_column_spec(mut self, spec: ColumnSpec) -> Self {
        self.columns.push(ColumnEntry::Spec(spec));
        self
    }

    /// Add a base filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.read_filter.push(filter);
        self
    }

    /// Add an ordering term
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Set the page size
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Add a toggle
    pub fn with_toggle(mut self, toggle: Toggle) -> Self {
        self.toggles.push(toggle);
        self
    }
}

// ============================================================================
// PresetCatalog
// ============================================================================

/// All presets known to the process, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetCatalog {
    presets: HashMap<String, ViewPreset>,
}

impl PresetCatalog {
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

    /// Fill each preset's `id` from its map key.
    pub fn finalize(&mut self) {
        for (id, preset) in self.presets.iter_mut() {
            if preset.id.is_empty() {
                preset.id = id.clone();
            }
        }
    }

    /// Register a preset under its own id
    pub fn insert(&mut self, preset: ViewPreset) {
        self.presets.insert(preset.id.clone(), preset);
    }

    /// Look up a preset by id
    pub fn get(&self, id: &str) -> Option<&ViewPreset> {
        self.presets.get(id)
    }

    /// List all preset ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.presets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate all presets
    pub fn iter(&self) -> impl Iterator<Item = &ViewPreset> {
        self.presets.values()
    }

    /// Number of presets
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
