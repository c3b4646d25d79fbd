//! Fieldmark CLI
//!
//! Indexes, exports and searches the demo collections against a
//! Typesense-compatible service.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod demo;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use fieldmark_search::TypesenseBackend;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

/// Install the fmt subscriber. `log` records from the library crates are
/// bridged into it.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut out = std::io::stdout();

    // Schemas are compiled locally; no connection needed.
    if let Command::Schema { collections } = &cli.command {
        let registry = demo::registry()?;
        return commands::schema(&registry, &collections.collections, &mut out);
    }

    let config = cli.load_config(&std::env::current_dir()?)?;
    let backend = Arc::new(TypesenseBackend::new(&config.backend)?);
    tracing::debug!(url = backend.base_url(), "Connecting");

    let service = demo::service(backend)?;
    commands::run(&service, cli.command, &mut out).await
}
