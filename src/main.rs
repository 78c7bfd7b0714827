//! Tabula
//!
//! Schema-driven field & view resolution engine for admin data
//! applications.
//!
//! This is the main entry point for the `tabula` command-line tools.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    tabula_cli::run()
}
