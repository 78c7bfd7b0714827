//! In-memory reference stores
//!
//! `MemoryStore` and `MemoryObjects` implement the external store
//! traits over seeded JSON fixtures. They power the test suites and
//! the CLI fixture runner, and double as executable documentation of
//! the store contracts. Both record call counts so tests can assert
//! what the engine actually asked for.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, PoisonError};
use serde_json::Value;
use tabula_core::{
    EngineError, EngineResult, Filter, FilterOp, Row, SaveTarget, SelectRequest, TableRef,
    ObjectStore, TabularStore,
};

// ============================================================================
// MemoryStore
// ============================================================================

/// An in-memory tabular store seeded from JSON rows.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    selects: AtomicUsize,
    updates: Mutex<Vec<(SaveTarget, Row)>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table from a JSON array of objects. Non-object entries
    /// are ignored.
    pub fn with_table(self, table: &str, rows: Value) -> Self {
        let parsed: Vec<Row> = rows
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();

        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TableRef::parse(table).qualified(), parsed);
        self
    }

    /// Number of select calls issued so far
    pub fn select_calls(&self) -> usize {
        self.selects.load(AtomicOrdering::Relaxed)
    }

    /// Every update call issued so far, in order
    pub fn recorded_updates(&self) -> Vec<(SaveTarget, Row)> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of a table's current rows
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TableRef::parse(table).qualified())
            .cloned()
            .unwrap_or_default()
    }
}

impl TabularStore for MemoryStore {
    async fn select(&self, request: &SelectRequest) -> EngineResult<Vec<Row>> {
        self.selects.fetch_add(1, AtomicOrdering::Relaxed);

        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tables
            .get(&request.table.qualified())
            .ok_or_else(|| EngineError::read(request.table.qualified(), "unknown table"))?;

        let mut rows: Vec<Row> = rows
            .iter()
            .filter(|row| matches_filters(row, &request.filters))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            for term in &request.order {
                let ord = compare_values(
                    a.get(&term.column).unwrap_or(&Value::Null),
                    b.get(&term.column).unwrap_or(&Value::Null),
                );
                let ord = if term.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        if let Some(limit) = request.limit {
            rows.truncate(limit as usize);
        }

        if let Some(columns) = &request.columns {
            for row in &mut rows {
                row.retain(|field, _| columns.iter().any(|c| c == field));
            }
        }

        Ok(rows)
    }

    async fn count(&self, table: &TableRef, filters: &[Filter]) -> EngineResult<u64> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tables
            .get(&table.qualified())
            .ok_or_else(|| EngineError::read(table.qualified(), "unknown table"))?;
        Ok(rows.iter().filter(|row| matches_filters(row, filters)).count() as u64)
    }

    async fn update(&self, target: &SaveTarget, fields: &Row) -> EngineResult<()> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((target.clone(), fields.clone()));

        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tables
            .get_mut(&target.table_ref().qualified())
            .ok_or_else(|| EngineError::write(&*target.table, "unknown table"))?;

        let row = rows
            .iter_mut()
            .find(|row| row.get(&target.pk_column) == Some(&target.pk_value))
            .ok_or_else(|| {
                EngineError::write(
                    &*target.table,
                    format!("no row with {} = {}", target.pk_column, target.pk_value),
                )
            })?;

        for (field, value) in fields {
            row.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn insert(&self, table: &TableRef, fields: &Row) -> EngineResult<Row> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(table.qualified())
            .or_default()
            .push(fields.clone());
        Ok(fields.clone())
    }
}

// ============================================================================
// Filter / order evaluation
// ============================================================================

fn matches_filters(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        let value = row.get(&filter.column);
        match filter.op {
            FilterOp::Eq => value == Some(&filter.value),
            FilterOp::Neq => value != Some(&filter.value),
            FilterOp::In => filter
                .value
                .as_array()
                .is_some_and(|allowed| value.is_some_and(|v| allowed.contains(v))),
            FilterOp::IsNull => value.is_none_or(Value::is_null),
        }
    })
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

// ============================================================================
// MemoryObjects
// ============================================================================

/// An in-memory object store with primary and fallback path tables.
#[derive(Debug)]
pub struct MemoryObjects {
    base_url: String,
    paths: HashMap<String, String>,
    fallback_paths: HashMap<String, String>,
    resolves: AtomicUsize,
}

impl MemoryObjects {
    /// Create an empty object store serving URLs under a base
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            paths: HashMap::new(),
            fallback_paths: HashMap::new(),
            resolves: AtomicUsize::new(0),
        }
    }

    /// Register an object in the primary table
    pub fn with_object(mut self, id: impl Into<String>, path: impl Into<String>) -> Self {
        self.paths.insert(id.into(), path.into());
        self
    }

    /// Register an object only the fallback view knows about
    pub fn with_fallback_object(mut self, id: impl Into<String>, path: impl Into<String>) -> Self {
        self.fallback_paths.insert(id.into(), path.into());
        self
    }

    /// Number of path resolutions attempted (primary + fallback)
    pub fn resolve_calls(&self) -> usize {
        self.resolves.load(AtomicOrdering::Relaxed)
    }
}

impl ObjectStore for MemoryObjects {
    async fn object_path(&self, id: &str) -> EngineResult<Option<String>> {
        self.resolves.fetch_add(1, AtomicOrdering::Relaxed);
        Ok(self.paths.get(id).cloned())
    }

    async fn object_path_fallback(&self, id: &str) -> EngineResult<Option<String>> {
        self.resolves.fetch_add(1, AtomicOrdering::Relaxed);
        Ok(self.fallback_paths.get(id).cloned())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, path)
    }
}

// ============================================================================
// Tests
// ============================================================================
