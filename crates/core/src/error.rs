//! Error types for Tabula
//!
//! This module provides unified error handling across the engine,
//! following one taxonomy: schema-catalog misses and lookup/attachment
//! failures are recoverable (they degrade a single field), read/write
//! failures are fatal to the operation that issued them.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Tabula
#[derive(Debug, Error)]
pub enum EngineError {
    // ========================================================================
    // Resolution Errors (recoverable, degrade a single field)
    // ========================================================================
    /// Field/table absent from the schema catalog
    #[error("Schema catalog has no entry for '{table}.{field}'")]
    SchemaLookupMiss { table: String, field: String },

    /// A lookup or enum query failed; the field falls back to raw display
    #[error("Lookup '{lookup}' could not be resolved: {message}")]
    LookupResolution { lookup: String, message: String },

    /// An object id could not be mapped to a storage path
    #[error("Attachment '{id}' could not be resolved: {message}")]
    AttachmentResolution { id: String, message: String },

    // ========================================================================
    // Store Errors (fatal to the issuing operation)
    // ========================================================================
    /// Underlying read query failed
    #[error("Read from '{table}' failed: {message}")]
    Read { table: String, message: String },

    /// A single-entity load matched no row (distinct from a failed query)
    #[error("No row in '{table}' with id '{id}'")]
    NotFound { table: String, id: String },

    /// Partial update rejected by the target table
    #[error("Write to '{table}' failed: {message}")]
    Write { table: String, message: String },

    // ========================================================================
    // Catalog Errors
    // ========================================================================
    /// Named preset absent from the preset catalog
    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    /// Catalog or preset failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // IO / Serialization Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// File write error
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// Catalog bundle version mismatch
    #[error("Catalog version mismatch: expected {expected}, found {found}")]
    CatalogVersionMismatch { expected: u32, found: u32 },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create a read failure for a table
    pub fn read(table: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::Read {
            table: table.into(),
            message: msg.into(),
        }
    }

    /// Create a write failure for a table
    pub fn write(table: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::Write {
            table: table.into(),
            message: msg.into(),
        }
    }

    /// Create a lookup-resolution failure
    pub fn lookup(name: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::LookupResolution {
            lookup: name.into(),
            message: msg.into(),
        }
    }

    /// Create an attachment-resolution failure
    pub fn attachment(id: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::AttachmentResolution {
            id: id.into(),
            message: msg.into(),
        }
    }

    /// Create a schema-catalog miss
    pub fn schema_miss(table: impl Into<String>, field: impl Into<String>) -> Self {
        EngineError::SchemaLookupMiss {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    /// Create an invalid-configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        EngineError::InvalidConfig(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        EngineError::Internal(msg.into())
    }

    /// Check if this error is a read failure (including not-found)
    pub fn is_read_failure(&self) -> bool {
        matches!(self, EngineError::Read { .. } | EngineError::NotFound { .. })
    }

    /// Check if this error is a write failure
    pub fn is_write_failure(&self) -> bool {
        matches!(self, EngineError::Write { .. })
    }

    /// Check if this error degrades a single field rather than failing
    /// the whole operation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::SchemaLookupMiss { .. }
                | EngineError::LookupResolution { .. }
                | EngineError::AttachmentResolution { .. }
        )
    }
}

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error() {
        let err = EngineError::read("loans", "connection refused");
        assert!(err.is_read_failure());
        assert!(!err.is_write_failure());
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Read from 'loans' failed: connection refused");
    }

    #[test]
    fn test_not_found_is_read_failure() {
        let err = EngineError::NotFound {
            table: "loans".to_string(),
            id: "L1".to_string(),
        };
        assert!(err.is_read_failure());
        assert_eq!(err.to_string(), "No row in 'loans' with id 'L1'");
    }

    #[test]
    fn test_write_error() {
        let err = EngineError::write("people_roles_associations", "permission denied");
        assert!(err.is_write_failure());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(EngineError::schema_miss("loans", "virtual_field").is_recoverable());
        assert!(EngineError::lookup("schools", "query failed").is_recoverable());
        assert!(EngineError::attachment("obj-1", "no such object").is_recoverable());
        assert!(!EngineError::validation("bad preset").is_recoverable());
    }

    #[test]
    fn test_schema_miss_message() {
        let err = EngineError::schema_miss("loans", "nickname");
        assert_eq!(
            err.to_string(),
            "Schema catalog has no entry for 'loans.nickname'"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
