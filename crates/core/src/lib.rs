//! # Tabula Core
//!
//! Core types, errors, and store traits for the Tabula engine.
//!
//! This crate provides the foundational building blocks used throughout
//! the Tabula workspace, including:
//!
//! - **Types**: the closed [`FieldType`] union, schema base types,
//!   table references, filter/order/select request types
//! - **Store traits**: the minimal [`TabularStore`] and [`ObjectStore`]
//!   capability surfaces the engine consumes
//! - **Errors**: unified error handling with [`EngineError`] and
//!   [`EngineResult`]
//! - **Labels**: field-name humanization with the abbreviation table
//!

pub mod error;
pub mod label;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{EngineError, EngineResult};
pub use label::humanize;
pub use store::{ObjectStore, Row, TabularStore};
pub use types::{
    DEFAULT_SCHEMA, FieldType, Filter, FilterOp, OptionItem, OrderBy, SaveTarget, SchemaBaseType,
    SelectRequest, TableRef, UpdateMode,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
