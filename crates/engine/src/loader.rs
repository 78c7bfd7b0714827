//! Entity data loading
//!
//! Issues filtered/ordered/limited reads against the tabular store and
//! transforms each raw row into a renderable record using resolved
//! field descriptors. Failures are isolated per the propagation
//! policy: a failed lookup degrades its field, an unidentifiable row
//! is skipped, and only a failed base query aborts the whole load.

use crate::config::EngineConfig;
use crate::options::OptionCache;
use crate::record::{EntityRecord, FieldView, ListPage};
use crate::resolver::{FieldDescriptor, FieldResolver, OptionsSource};
use crate::transform::{raw_text, render_value};
use crate::view::{ResolvedColumn, ResolvedView};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tabula_core::{
    EngineError, EngineResult, Filter, ObjectStore, OptionItem, Row, SelectRequest, TableRef,
    TabularStore,
};

// ============================================================================
// LoadOptions
// ============================================================================

/// Caller-supplied context for a list load.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Parent entity id, for child lists
    pub parent_id: Option<Value>,

    /// Parent module, deciding the foreign-key column. Falls back to
    /// the view's resolution context.
    pub parent_module: Option<String>,

    /// Toggle states overriding each toggle's `default_on`
    pub toggles: HashMap<String, bool>,

    /// Extra filters appended to the composed set
    pub extra_filters: Vec<Filter>,

    /// Report the total available count alongside the page
    pub want_total: bool,

    /// Page size override
    pub limit: Option<u32>,
}

impl LoadOptions {
    /// Child-list options scoped to a parent entity
    pub fn for_parent(module: impl Into<String>, parent_id: impl Into<Value>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            parent_module: Some(module.into()),
            ..Self::default()
        }
    }

    /// Set a toggle's state
    pub fn with_toggle(mut self, name: impl Into<String>, active: bool) -> Self {
        self.toggles.insert(name.into(), active);
        self
    }

    /// Request the total count
    pub fn with_total(mut self) -> Self {
        self.want_total = true;
        self
    }
}

// ============================================================================
// EntityLoader
// ============================================================================

/// Loads and transforms entity rows.
#[derive(Debug)]
pub struct EntityLoader<S, B> {
    store: Arc<S>,
    objects: Arc<B>,
    options: Arc<OptionCache<S>>,
    fields: FieldResolver,
    config: Arc<EngineConfig>,
}

impl<S: TabularStore, B: ObjectStore> EntityLoader<S, B> {
    /// Create a loader over the shared stores and catalogs
    pub fn new(
        store: Arc<S>,
        objects: Arc<B>,
        options: Arc<OptionCache<S>>,
        fields: FieldResolver,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            objects,
            options,
            fields,
            config,
        }
    }

    // ====================================================================
    // List loads
    // ====================================================================

    /// Load one page of a resolved view.
    pub async fn load_many(
        &self,
        view: &ResolvedView,
        opts: &LoadOptions,
    ) -> EngineResult<ListPage> {
        let filters = self.compose_filters(view, opts);

        let mut request =
            SelectRequest::new(view.source.clone()).with_limit(opts.limit.unwrap_or(view.limit));
        request.filters = filters.clone();
        request.order = view.order_by.clone();

        // A failed base query aborts the whole load; zero rows is a
        // successful empty page
        let rows = self.store.select(&request).await?;

        let total = if opts.want_total {
            Some(self.store.count(&view.source, &filters).await?)
        } else {
            None
        };

        let preloaded = self.preload_options(&view.columns).await;

        let mut records = Vec::with_capacity(rows.len());
        let mut sidecars: HashMap<(String, String), Option<Row>> = HashMap::new();
        for row in rows {
            if let Some(record) = self.build_record(view, row, &preloaded, &mut sidecars).await {
                records.push(record);
            }
        }

        Ok(ListPage { records, total })
    }

    /// Compose the effective filter set: base filter, active toggles,
    /// parent scoping, extras.
    fn compose_filters(&self, view: &ResolvedView, opts: &LoadOptions) -> Vec<Filter> {
        let mut filters = view.read_filter.clone();

        for toggle in &view.toggles {
            let active = opts
                .toggles
                .get(&toggle.name)
                .copied()
                .unwrap_or(toggle.default_on);
            if active {
                filters.push(toggle.filter.clone());
            }
        }

        if let Some(parent_id) = &opts.parent_id {
            let module = opts
                .parent_module
                .as_deref()
                .or(view.context_module.as_deref());
            match module {
                Some(module) => {
                    filters.push(Filter::eq(self.config.parent_column(module), parent_id.clone()));
                }
                None => {
                    tracing::warn!(view = %view.id, "parent id supplied without a module; ignoring");
                }
            }
        }

        filters.extend(opts.extra_filters.iter().cloned());
        filters
    }

    // ====================================================================
    // Single-entity loads
    // ====================================================================

    /// Load a single entity by id, resolving a descriptor for every
    /// column present on the row.
    pub async fn load_one(&self, table: &str, id: &str) -> EngineResult<EntityRecord> {
        let table = TableRef::parse(table);
        let request = SelectRequest::new(table.clone())
            .with_filter(Filter::eq("id", id))
            .with_limit(1);

        let mut rows = self.store.select(&request).await?;
        if rows.is_empty() {
            return Err(EngineError::NotFound {
                table: table.qualified(),
                id: id.to_string(),
            });
        }
        let row = rows.remove(0);

        let mut fields = BTreeMap::new();
        for (field, value) in &row {
            let descriptor = self.fields.resolve(&table, field, None);
            let options = self.options_for(&descriptor).await;
            let display = render_value(
                value,
                &descriptor,
                options.as_deref().map(Vec::as_slice),
                &row,
                self.objects.as_ref(),
                &self.config,
                None,
            )
            .await;
            fields.insert(
                field.clone(),
                FieldView {
                    raw: value.clone(),
                    display,
                    editable: descriptor.editable,
                    field_type: descriptor.field_type,
                    options,
                },
            );
        }

        Ok(EntityRecord {
            id: id.to_string(),
            table,
            original: row,
            fields,
        })
    }

    // ====================================================================
    // Record construction
    // ====================================================================

    /// Pre-load the option set of every selection column. Failures are
    /// isolated: the field renders raw values and the load continues.
    async fn preload_options(
        &self,
        columns: &[ResolvedColumn],
    ) -> HashMap<String, Arc<Vec<OptionItem>>> {
        let mut loaded = HashMap::new();
        for column in columns {
            let descriptor = &column.descriptor;
            if let Some(options) = self.options_for(descriptor).await {
                loaded.insert(descriptor.field.clone(), options);
            }
        }
        loaded
    }

    async fn options_for(&self, descriptor: &FieldDescriptor) -> Option<Arc<Vec<OptionItem>>> {
        match &descriptor.options {
            Some(OptionsSource::Static(items)) => Some(Arc::new(items.clone())),
            Some(OptionsSource::Lookup(spec)) => match self.options.get_or_load(spec).await {
                Ok(options) => Some(options),
                Err(e) => {
                    tracing::warn!(
                        field = %descriptor.field,
                        error = %e,
                        "lookup preload failed; field renders raw values"
                    );
                    None
                }
            },
            None => None,
        }
    }

    /// Transform one raw row. Rows without an id cannot be keyed or
    /// saved; they are skipped with a warning.
    async fn build_record(
        &self,
        view: &ResolvedView,
        row: Row,
        preloaded: &HashMap<String, Arc<Vec<OptionItem>>>,
        sidecars: &mut HashMap<(String, String), Option<Row>>,
    ) -> Option<EntityRecord> {
        let id = raw_text(row.get("id").unwrap_or(&Value::Null));
        if id.is_empty() {
            tracing::warn!(view = %view.id, "row without id skipped");
            return None;
        }

        let mut fields = BTreeMap::new();
        for column in &view.columns {
            let descriptor = &column.descriptor;
            let raw = self.field_raw(descriptor, &row, &id, sidecars).await;
            let options = preloaded.get(&descriptor.field).cloned();
            let display = render_value(
                &raw,
                descriptor,
                options.as_deref().map(Vec::as_slice),
                &row,
                self.objects.as_ref(),
                &self.config,
                column.max_entries,
            )
            .await;

            fields.insert(
                descriptor.field.clone(),
                FieldView {
                    raw,
                    display,
                    editable: descriptor.editable,
                    field_type: descriptor.field_type,
                    options,
                },
            );
        }

        Some(EntityRecord {
            id,
            table: view.source.clone(),
            original: row,
            fields,
        })
    }

    /// Raw value for a field, following cross-table redirection. The
    /// sidecar row is fetched once per distinct table per entity and
    /// cached for the duration of the resolve pass.
    async fn field_raw(
        &self,
        descriptor: &FieldDescriptor,
        row: &Row,
        id: &str,
        sidecars: &mut HashMap<(String, String), Option<Row>>,
    ) -> Value {
        let Some(write_table) = descriptor.write_table.as_deref() else {
            return row.get(&descriptor.field).cloned().unwrap_or(Value::Null);
        };
        if TableRef::parse(write_table) == descriptor.table {
            return row.get(&descriptor.field).cloned().unwrap_or(Value::Null);
        }

        let key = (write_table.to_string(), id.to_string());
        if !sidecars.contains_key(&key) {
            let fetched = self.fetch_sidecar(descriptor, write_table, id).await;
            sidecars.insert(key.clone(), fetched);
        }

        sidecars
            .get(&key)
            .and_then(Option::as_ref)
            .and_then(|sidecar| sidecar.get(&descriptor.field))
            .cloned()
            .unwrap_or(Value::Null)
    }

    async fn fetch_sidecar(
        &self,
        descriptor: &FieldDescriptor,
        write_table: &str,
        id: &str,
    ) -> Option<Row> {
        let table = TableRef::parse(write_table);
        let key_column = descriptor
            .write_key_column
            .clone()
            .unwrap_or_else(|| self.config.parent_column(&descriptor.table.table));

        let request = SelectRequest::new(table.clone())
            .with_filter(Filter::eq(key_column, id))
            .with_limit(1);

        match self.store.select(&request).await {
            Ok(mut rows) if !rows.is_empty() => Some(rows.remove(0)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "cross-table fetch failed");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
