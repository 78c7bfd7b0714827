//! Option cache
//!
//! Memoizes lookup-table query results, keyed by the full
//! (table, value column, label column) triple, for the life of the
//! cache (or until cleared). The cache is an explicit object with an
//! injectable scope — construct one per process, per request, or per
//! test as needed.
//!
//! Concurrency: the lock is never held across an await. Concurrent
//! misses on the same key may each run the underlying query once; the
//! first insert wins and later fetches are discarded. That bounded
//! redundancy is accepted in place of in-flight de-duplication.

use crate::transform::raw_text;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tabula_catalog::LookupSpec;
use tabula_core::{
    EngineError, EngineResult, Filter, OptionItem, OrderBy, SelectRequest, TableRef, TabularStore,
};

/// The one lookup table served pre-filtered to active rows only.
pub const ACTIVE_ONLY_TABLE: &str = "schools";

// ============================================================================
// OptionCache
// ============================================================================

/// Shared, memoizing loader for lookup options.
#[derive(Debug)]
pub struct OptionCache<S> {
    store: Arc<S>,
    entries: Mutex<HashMap<LookupSpec, Arc<Vec<OptionItem>>>>,
}

impl<S: TabularStore> OptionCache<S> {
    /// Create an empty cache over a store
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get the options for a lookup, querying the store on first use.
    ///
    /// Returned lists are shared immutable; deep-copy before mutating
    /// labels, or sibling fields see the edit.
    pub async fn get_or_load(&self, spec: &LookupSpec) -> EngineResult<Arc<Vec<OptionItem>>> {
        if let Some(options) = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(spec)
        {
            return Ok(Arc::clone(options));
        }

        let options = Arc::new(self.fetch(spec).await?);

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        // A concurrent miss may have inserted first; keep its result
        let entry = entries
            .entry(spec.clone())
            .or_insert_with(|| Arc::clone(&options));
        Ok(Arc::clone(entry))
    }

    /// Run the underlying lookup query.
    async fn fetch(&self, spec: &LookupSpec) -> EngineResult<Vec<OptionItem>> {
        let table = TableRef::parse(&spec.table);

        let mut request = SelectRequest::new(table.clone())
            .with_columns(vec![spec.value_column.clone(), spec.label_column.clone()])
            .with_order(OrderBy::asc(&*spec.label_column));

        if table.table == ACTIVE_ONLY_TABLE {
            request = request.with_filter(Filter::eq("active", true));
        }

        let rows = self
            .store
            .select(&request)
            .await
            .map_err(|e| EngineError::lookup(&*spec.table, e.to_string()))?;

        tracing::debug!(table = %spec.table, rows = rows.len(), "loaded lookup options");

        let options = rows
            .iter()
            .filter_map(|row| {
                let value = row.get(&spec.value_column)?;
                if value.is_null() {
                    return None;
                }
                let value = raw_text(value);
                let label = row
                    .get(&spec.label_column)
                    .map(raw_text)
                    .filter(|label| !label.is_empty())
                    .unwrap_or_else(|| value.clone());
                Some(OptionItem::new(value, label))
            })
            .collect();

        Ok(options)
    }

    /// Number of cached lookups
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if nothing is cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached lookup (catalog regeneration).
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
