//! External store capability traits
//!
//! Tabula never talks to a database or object store directly; it only
//! sees the minimal capability surface defined here. Production
//! deployments implement these traits over their actual backends; the
//! engine crate ships an in-memory reference implementation for
//! fixtures and tests.

use crate::error::EngineResult;
use crate::types::{Filter, SaveTarget, SelectRequest, TableRef};

/// A raw row as returned by the tabular store.
///
/// Cell values are untyped JSON; the resolution engine is responsible
/// for interpreting them against field descriptors.
pub type Row = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// TabularStore
// ============================================================================

/// Minimal surface of the external tabular data store.
///
/// All operations are I/O-bound single-record or single-list requests.
/// Implementations must be safe to share across concurrent list loads.
#[allow(async_fn_in_trait)]
pub trait TabularStore: Send + Sync {
    /// Run a filtered/ordered/limited read and return the matching rows.
    async fn select(&self, request: &SelectRequest) -> EngineResult<Vec<Row>>;

    /// Count the rows matching a filter set, ignoring any page limit.
    async fn count(&self, table: &TableRef, filters: &[Filter]) -> EngineResult<u64>;

    /// Apply a partial update to the row identified by the target.
    async fn update(&self, target: &SaveTarget, fields: &Row) -> EngineResult<()>;

    /// Insert a new row and return it as stored.
    async fn insert(&self, table: &TableRef, fields: &Row) -> EngineResult<Row>;
}

// ============================================================================
// ObjectStore
// ============================================================================

/// Minimal surface of the external object/blob store.
#[allow(async_fn_in_trait)]
pub trait ObjectStore: Send + Sync {
    /// Resolve a stored-object id to its storage path.
    ///
    /// Returns `Ok(None)` when the id is unknown; errors are reserved
    /// for transport failures.
    async fn object_path(&self, id: &str) -> EngineResult<Option<String>>;

    /// Secondary lookup view consulted when [`object_path`] finds
    /// nothing (legacy objects live here).
    ///
    /// [`object_path`]: ObjectStore::object_path
    async fn object_path_fallback(&self, id: &str) -> EngineResult<Option<String>>;

    /// Build the public URL for a resolved bucket/path pair.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
