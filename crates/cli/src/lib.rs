//! # Tabula CLI
//!
//! Command-line interface for the Tabula engine.
//!
//! ## Commands
//!
//! - `validate` - Validate a catalog bundle or directory
//! - `inspect` - Show a table's schema metadata
//! - `field` - Resolve one field descriptor
//! - `preset` - Resolve a preset into its column set
//! - `run` - Load a preset against a JSON fixture through the engine
//!

// Re-export dependencies for use in main.rs
pub use tabula_catalog;
pub use tabula_core;
pub use tabula_engine;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabula_catalog::{CatalogBundle, PresetCatalog, load_bundle, validate_bundle};
use tabula_core::TableRef;
use tabula_engine::{
    Engine, EngineConfig, FieldResolver, LoadOptions, MemoryObjects, MemoryStore, OptionsSource,
    ViewResolver,
};
use walkdir::WalkDir;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Argument parsing
// ============================================================================

/// Top-level CLI arguments
#[derive(Debug, Parser)]
#[command(name = "tabula", version, about = "Schema-driven admin engine tools")]
pub struct Cli {
    /// Catalog bundle file or catalog directory
    #[arg(long, global = true, default_value = "catalog")]
    pub catalog: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate the catalog
    Validate,

    /// Show a table's schema metadata
    Inspect {
        /// Table name, optionally schema-qualified
        table: String,
    },

    /// Resolve one field descriptor
    Field {
        /// Table name, optionally schema-qualified
        table: String,
        /// Field name
        field: String,
    },

    /// Resolve a preset into its column set
    Preset {
        /// Preset id
        id: String,
        /// Module context for child lists
        #[arg(long)]
        module: Option<String>,
    },

    /// Run a preset against a JSON fixture
    Run {
        /// Preset id
        preset: String,
        /// Fixture file: a JSON object mapping table names to row arrays
        fixture: PathBuf,
        /// Engine configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse arguments and dispatch. Called by the `tabula` binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dispatch(&cli)
}

/// Dispatch one parsed invocation.
pub fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let bundle = load_catalog(&cli.catalog)
        .with_context(|| format!("loading catalog from {}", cli.catalog.display()))?;

    match &cli.command {
        Command::Validate => validate(&bundle),
        Command::Inspect { table } => inspect(&bundle, table),
        Command::Field { table, field } => show_field(&bundle, table, field),
        Command::Preset { id, module } => show_preset(bundle, id, module.as_deref()),
        Command::Run {
            preset,
            fixture,
            config,
        } => run_fixture(bundle, preset, fixture, config.as_deref()),
    }
}

// ============================================================================
// Catalog loading
// ============================================================================

/// Load a catalog from a bundle file, or from a directory holding
/// `schema.json`, `lookups.json`, and preset files (any `*.json` under
/// `presets/`).
pub fn load_catalog(path: &Path) -> anyhow::Result<CatalogBundle> {
    if path.is_file() {
        return Ok(load_bundle(path)?);
    }
    if !path.is_dir() {
        bail!("catalog path {} does not exist", path.display());
    }

    let schema = match path.join("schema.json") {
        p if p.is_file() => tabula_catalog::load_schema(&p)?,
        _ => Default::default(),
    };
    let lookups = match path.join("lookups.json") {
        p if p.is_file() => tabula_catalog::load_lookups(&p)?,
        _ => Default::default(),
    };

    let mut presets = PresetCatalog::new();
    let preset_dir = path.join("presets");
    if preset_dir.is_dir() {
        for entry in WalkDir::new(&preset_dir).into_iter().filter_map(Result::ok) {
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
            {
                let loaded = tabula_catalog::load_presets(entry.path())
                    .with_context(|| format!("parsing {}", entry.path().display()))?;
                for preset in loaded.iter() {
                    presets.insert(preset.clone());
                }
            }
        }
    }

    Ok(CatalogBundle::new(schema, lookups, presets))
}

// ============================================================================
// Commands
// ============================================================================

fn validate(bundle: &CatalogBundle) -> anyhow::Result<()> {
    let report = validate_bundle(bundle);

    for warning in &report.warnings {
        println!(
            "{} {} — {}",
            "warning".yellow().bold(),
            warning.path,
            warning.message
        );
    }
    for error in &report.errors {
        println!("{} {} — {}", "error".red().bold(), error.path, error.message);
    }

    if report.has_errors() {
        bail!(
            "catalog invalid: {} error(s), {} warning(s)",
            report.errors.len(),
            report.warnings.len()
        );
    }

    println!(
        "{} {} preset(s), {} column(s), {} warning(s)",
        "ok".green().bold(),
        bundle.presets.len(),
        bundle.schema.column_count(),
        report.warnings.len()
    );
    Ok(())
}

fn inspect(bundle: &CatalogBundle, table: &str) -> anyhow::Result<()> {
    let table = TableRef::parse(table);
    let Some(columns) = bundle.schema.table_columns(&table) else {
        bail!("table '{table}' is not in the schema catalog");
    };

    println!("{}", table.qualified().as_str().bold());
    let mut names: Vec<&String> = columns.keys().collect();
    names.sort();
    for name in names {
        let column = &columns[name];
        let mut notes = Vec::new();
        if column.is_array {
            notes.push("array".to_string());
        }
        if column.is_nullable {
            notes.push("nullable".to_string());
        }
        if let Some(enum_ref) = &column.enum_ref {
            notes.push(format!("enum:{enum_ref}"));
        }
        for fk in &column.foreign_keys {
            notes.push(format!("-> {}.{}", fk.table, fk.column));
        }
        println!(
            "  {:<24} {:?} {}",
            name,
            column.base_type,
            notes.join(" ").as_str().dimmed()
        );
    }
    Ok(())
}

fn show_field(bundle: &CatalogBundle, table: &str, field: &str) -> anyhow::Result<()> {
    let resolver = FieldResolver::new(
        Arc::new(bundle.schema.clone()),
        Arc::new(bundle.lookups.clone()),
    );
    let table = TableRef::parse(table);
    let descriptor = resolver.resolve(&table, field, None);

    println!("{}", format!("{}.{}", table, descriptor.field).as_str().bold());
    println!("  label       {}", descriptor.label);
    println!("  type        {}", descriptor.field_type);
    println!("  array       {}", descriptor.is_array);
    println!("  editable    {}", descriptor.editable);
    println!("  in schema   {}", descriptor.schema_known);
    match &descriptor.options {
        Some(OptionsSource::Static(options)) => {
            println!("  options     {} static value(s)", options.len());
        }
        Some(OptionsSource::Lookup(spec)) => {
            println!(
                "  options     lookup {} ({} -> {})",
                spec.table, spec.value_column, spec.label_column
            );
        }
        None => {}
    }
    Ok(())
}

fn show_preset(bundle: CatalogBundle, id: &str, module: Option<&str>) -> anyhow::Result<()> {
    let resolver = FieldResolver::new(Arc::new(bundle.schema), Arc::new(bundle.lookups));
    let views = ViewResolver::new(Arc::new(bundle.presets), resolver);
    let view = views.resolve(id, module)?;

    println!("{} ({})", view.title.as_str().bold(), view.source);
    println!(
        "  limit {}, {} filter(s), {} toggle(s)",
        view.limit,
        view.read_filter.len(),
        view.toggles.len()
    );
    for column in &view.columns {
        let slot = column
            .slot
            .map(|s| format!("{s:?}").to_lowercase())
            .unwrap_or_default();
        println!(
            "  {:<24} {:<12} {}",
            column.descriptor.field,
            column.descriptor.field_type.to_string(),
            slot.as_str().dimmed()
        );
    }
    Ok(())
}

fn run_fixture(
    bundle: CatalogBundle,
    preset: &str,
    fixture: &Path,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(fixture)
        .with_context(|| format!("reading fixture {}", fixture.display()))?;
    let tables: HashMap<String, serde_json::Value> =
        serde_json::from_str(&raw).context("fixture must map table names to row arrays")?;

    let mut store = MemoryStore::new();
    for (table, rows) in tables {
        store = store.with_table(&table, rows);
    }

    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let engine = Engine::new(
        bundle,
        Arc::new(store),
        Arc::new(MemoryObjects::new("https://objects.local")),
        config,
    );

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async {
        let view = engine.views.resolve(preset, None)?;
        let page = engine
            .loader
            .load_many(&view, &LoadOptions::default().with_total())
            .await?;

        let header: Vec<String> = view
            .columns
            .iter()
            .map(|c| c.descriptor.label.clone())
            .collect();
        println!("{}", header.join(" | ").as_str().bold());

        for record in &page.records {
            let cells: Vec<&str> = view
                .columns
                .iter()
                .map(|c| record.display(&c.descriptor.field))
                .collect();
            println!("{}", cells.join(" | "));
        }
        println!(
            "{}",
            format!(
                "{} row(s) shown, {} total",
                page.records.len(),
                page.total.unwrap_or(page.records.len() as u64)
            )
            .as_str()
            .dimmed()
        );
        anyhow::Ok(())
    })?;

    tracing::debug!(preset, "fixture run complete");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
