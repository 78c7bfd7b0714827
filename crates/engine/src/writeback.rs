//! Write-back coordination
//!
//! Routes edited fields back to the authoritative (schema, table,
//! key, column) destination and issues minimal partial updates. One
//! default save target per entity; fields whose descriptor names a
//! different `write_table` redirect to a derived target keyed by the
//! entity id. Multi-target saves are not transactional: a failure
//! partway through leaves earlier targets committed, and the error
//! says so.

use crate::config::EngineConfig;
use crate::record::EntityRecord;
use crate::resolver::{FieldDescriptor, FieldResolver};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tabula_core::{EngineError, EngineResult, Row, SaveTarget, TableRef, TabularStore};
use uuid::Uuid;

// ============================================================================
// SavePlan
// ============================================================================

/// The grouped updates a save will issue: one partial update per
/// target, primary table first, secondary targets in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePlan {
    /// (target, fields) pairs in issue order
    pub updates: Vec<(SaveTarget, Row)>,
}

impl SavePlan {
    /// Check whether the plan issues any write at all
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Number of distinct targets written
    pub fn target_count(&self) -> usize {
        self.updates.len()
    }
}

// ============================================================================
// SaveOutcome
// ============================================================================

/// Result of an executed save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// Targets written, in order
    pub committed: Vec<SaveTarget>,
}

// ============================================================================
// SaveCoordinator
// ============================================================================

/// Plans and executes write-backs.
#[derive(Debug)]
pub struct SaveCoordinator<S> {
    store: Arc<S>,
    fields: FieldResolver,
    config: Arc<EngineConfig>,
}

impl<S: TabularStore> SaveCoordinator<S> {
    /// Create a coordinator over the store and catalogs
    pub fn new(store: Arc<S>, fields: FieldResolver, config: Arc<EngineConfig>) -> Self {
        Self {
            store,
            fields,
            config,
        }
    }

    // ====================================================================
    // Planning
    // ====================================================================

    /// Plan the updates for an edited entity. Pure: diffing, update-mode
    /// filtering, and target routing happen here, without touching the
    /// store.
    ///
    /// Descriptors supplied by the caller (usually from the resolved
    /// view) take precedence; anything missing is resolved fresh.
    pub fn plan(
        &self,
        record: &EntityRecord,
        descriptors: &HashMap<String, FieldDescriptor>,
        draft: &Row,
    ) -> SavePlan {
        let changed = record.diff(draft);
        let entity_id = Value::String(record.id.clone());

        let primary = SaveTarget::new(&record.table, "id", entity_id.clone());

        let mut primary_fields = Row::new();
        let mut secondary: Vec<(SaveTarget, Row)> = Vec::new();

        for (field, value) in changed {
            let descriptor = descriptors
                .get(&field)
                .cloned()
                .unwrap_or_else(|| self.fields.resolve(&record.table, &field, None));

            // Edits only; creation goes through `create`
            if !descriptor.update_mode.writable(false) || !descriptor.editable {
                tracing::debug!(field, "field excluded from update");
                continue;
            }

            match self.redirect_target(&descriptor, &record.table, &entity_id) {
                Some(target) => {
                    match secondary.iter_mut().find(|(t, _)| *t == target) {
                        Some((_, fields)) => {
                            fields.insert(field, value);
                        }
                        None => {
                            let mut fields = Row::new();
                            fields.insert(field, value);
                            secondary.push((target, fields));
                        }
                    }
                }
                None => {
                    primary_fields.insert(field, value);
                }
            }
        }

        secondary.sort_by(|(a, _), (b, _)| a.table.cmp(&b.table));

        let mut updates = Vec::new();
        if !primary_fields.is_empty() {
            updates.push((primary, primary_fields));
        }
        updates.extend(secondary);

        SavePlan { updates }
    }

    /// Derive the secondary target for a cross-table field, if its
    /// descriptor names one.
    fn redirect_target(
        &self,
        descriptor: &FieldDescriptor,
        source: &TableRef,
        entity_id: &Value,
    ) -> Option<SaveTarget> {
        let write_table = descriptor.write_table.as_deref()?;
        let table = TableRef::parse(write_table);
        if table == *source {
            return None;
        }

        let key_column = descriptor
            .write_key_column
            .clone()
            .unwrap_or_else(|| self.config.parent_column(&source.table));

        Some(SaveTarget::new(&table, key_column, entity_id.clone()))
    }

    // ====================================================================
    // Execution
    // ====================================================================

    /// Plan and execute a save. A no-edit draft issues zero write
    /// calls. On failure, targets already written stay committed; the
    /// error reports how many.
    pub async fn save(
        &self,
        record: &EntityRecord,
        descriptors: &HashMap<String, FieldDescriptor>,
        draft: &Row,
    ) -> EngineResult<SaveOutcome> {
        let plan = self.plan(record, descriptors, draft);
        let mut committed = Vec::with_capacity(plan.updates.len());

        for (target, fields) in plan.updates {
            if let Err(e) = self.store.update(&target, &fields).await {
                return Err(EngineError::write(
                    &*target.table,
                    format!(
                        "{e} ({} earlier target(s) already committed)",
                        committed.len()
                    ),
                ));
            }
            tracing::debug!(target = %target, fields = fields.len(), "partial update applied");
            committed.push(target);
        }

        Ok(SaveOutcome { committed })
    }

    /// Create a new entity. New-only fields are included; an id is
    /// generated when the caller supplies none.
    pub async fn create(
        &self,
        table: &TableRef,
        descriptors: &HashMap<String, FieldDescriptor>,
        fields: &Row,
    ) -> EngineResult<Row> {
        let mut insert = Row::new();
        for (field, value) in fields {
            let descriptor = descriptors
                .get(field)
                .cloned()
                .unwrap_or_else(|| self.fields.resolve(table, field, None));
            if descriptor.update_mode.writable(true) {
                insert.insert(field.clone(), value.clone());
            }
        }

        if !insert.contains_key("id") {
            insert.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }

        self.store.insert(table, &insert).await
    }
}

// ============================================================================
// Tests
// ============================================================================
