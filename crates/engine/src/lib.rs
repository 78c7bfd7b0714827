//! # Tabula Engine
//!
//! The schema-driven field & view resolution engine.
//!
//! ## Pipeline
//!
//! ```text
//! SchemaCatalog + LookupRegistry ──► FieldResolver ──► FieldDescriptor
//!                                         │
//! PresetCatalog ──────────────► ViewResolver ──► ResolvedView
//!                                         │
//! TabularStore + ObjectStore ──► EntityLoader ⇄ OptionCache ──► EntityRecord
//!                                         │
//!                              SaveCoordinator ──► partial updates
//! ```
//!
//! The resolvers are pure and synchronous; the loader, option cache,
//! and save coordinator are async over the external store traits.
//! [`Engine`] bundles the whole pipeline over one store pair.

pub mod config;
pub mod infer;
pub mod loader;
pub mod memory;
pub mod options;
pub mod record;
pub mod resolver;
pub mod transform;
pub mod view;
pub mod writeback;

// Re-export commonly used types at crate root
pub use config::EngineConfig;
pub use infer::{FieldFacts, INFERENCE_RULES, InferenceRule, InferredType, infer};
pub use loader::{EntityLoader, LoadOptions};
pub use memory::{MemoryObjects, MemoryStore};
pub use options::{ACTIVE_ONLY_TABLE, OptionCache};
pub use record::{EntityRecord, FieldView, ListPage};
pub use resolver::{FieldDescriptor, FieldResolver, InferredDefaults, OptionsSource, merge};
pub use transform::{format_currency, format_date, raw_text, render_value};
pub use view::{ResolvedColumn, ResolvedView, ViewResolver};
pub use writeback::{SaveCoordinator, SaveOutcome, SavePlan};

// Re-export the error surface alongside the engine types
pub use tabula_core::{EngineError, EngineResult};

use std::sync::Arc;
use tabula_catalog::CatalogBundle;
use tabula_core::{ObjectStore, TabularStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Engine
// ============================================================================

/// The assembled resolution pipeline over one store pair.
#[derive(Debug)]
pub struct Engine<S, B> {
    /// Field descriptor resolution
    pub fields: FieldResolver,

    /// Preset resolution with per-process memoization
    pub views: ViewResolver,

    /// Row loading and transformation
    pub loader: EntityLoader<S, B>,

    /// Write-back routing
    pub writer: SaveCoordinator<S>,

    /// Shared lookup-option cache
    pub options: Arc<OptionCache<S>>,
}

impl<S: TabularStore, B: ObjectStore> Engine<S, B> {
    /// Assemble an engine from a loaded catalog bundle, a store pair,
    /// and configuration.
    pub fn new(bundle: CatalogBundle, store: Arc<S>, objects: Arc<B>, config: EngineConfig) -> Self {
        let schema = Arc::new(bundle.schema);
        let lookups = Arc::new(bundle.lookups);
        let presets = Arc::new(bundle.presets);
        let config = Arc::new(config);

        let fields = FieldResolver::new(schema, lookups);
        let views = ViewResolver::new(presets, fields.clone());
        let options = Arc::new(OptionCache::new(Arc::clone(&store)));
        let loader = EntityLoader::new(
            Arc::clone(&store),
            objects,
            Arc::clone(&options),
            fields.clone(),
            Arc::clone(&config),
        );
        let writer = SaveCoordinator::new(store, fields.clone(), config);

        Self {
            fields,
            views,
            loader,
            writer,
            options,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
