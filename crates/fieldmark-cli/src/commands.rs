//! Command handlers.
//!
//! Handlers write their results to the given writer and report progress
//! through `tracing`.

use std::io::Write;

use anyhow::{Result, bail};
use fieldmark_search::{PageSize, SchemaRegistry, SearchContext, SearchService};
use serde_json::json;
use tracing::info;

use crate::cli::Command;
use crate::demo::SearchItem;

/// Dispatch a parsed command.
pub async fn run<W: Write>(
    service: &SearchService<SearchItem>,
    command: Command,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Index {
            collections,
            truncate,
        } => index(service, &collections.collections, truncate, out).await,
        Command::Export { collections } => export(service, &collections.collections, out).await,
        Command::Search {
            collection,
            query,
            page,
            page_size,
        } => search(service, &collection, &query, page, page_size, out).await,
        Command::Schema { collections } => {
            schema(service.registry(), &collections.collections, out)
        }
        Command::Delete { collections } => delete(service, &collections.collections, out).await,
    }
}

/// Sync the named collections with their repositories.
pub async fn index<W: Write>(
    service: &SearchService<SearchItem>,
    names: &[String],
    truncate: bool,
    out: &mut W,
) -> Result<()> {
    for collection in service.registry().resolve_names(names)? {
        let name = service.registry().get(&collection)?.name().to_string();
        info!(collection = %name, truncate, "Indexing");
        let stats = service.sync(&collection, truncate).await?;
        writeln!(
            out,
            "{name}: {} indexed, {} deleted{}",
            stats.indexed,
            stats.deleted,
            if stats.truncated { " (truncated)" } else { "" }
        )?;
    }
    Ok(())
}

/// Write every document of the named collections as JSON lines.
pub async fn export<W: Write>(
    service: &SearchService<SearchItem>,
    names: &[String],
    out: &mut W,
) -> Result<()> {
    for collection in service.registry().resolve_names(names)? {
        let name = service.registry().get(&collection)?.name().to_string();
        info!(collection = %name, "Exporting");
        let jsonl = service.export(&collection).await?;
        for line in jsonl.lines().filter(|l| !l.trim().is_empty()) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

/// Query one collection and print the resolved items.
pub async fn search<W: Write>(
    service: &SearchService<SearchItem>,
    name: &str,
    query: &str,
    page: u32,
    page_size: u32,
    out: &mut W,
) -> Result<()> {
    let resolved = service.registry().resolve_names(&[name])?;
    let [collection] = resolved.as_slice() else {
        bail!("Search needs exactly one collection, got \"{name}\".");
    };

    let context = SearchContext::new(*collection)
        .with_query(query)
        .with_page(page)?
        .with_page_size(PageSize::try_from(page_size)?);
    info!(collection = %name, query, page, page_size, "Searching");

    let result = service.search(&context).await?;
    writeln!(out, "Found {} result(s)", result.total_count)?;
    for item in &result.items {
        writeln!(out, "{}", serde_json::to_string(item)?)?;
    }
    Ok(())
}

/// Print the compiled schema and search parameters of the named
/// collections.
pub fn schema<W: Write>(registry: &SchemaRegistry, names: &[String], out: &mut W) -> Result<()> {
    for collection in registry.resolve_names(names)? {
        let compiled = registry.get(&collection)?.compiled();
        let value = json!({
            "schema": compiled.schema.to_value()?,
            "query_by": compiled.query_by,
            "sort_by": compiled.sort_by,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    }
    Ok(())
}

/// Drop the named collections.
pub async fn delete<W: Write>(
    service: &SearchService<SearchItem>,
    names: &[String],
    out: &mut W,
) -> Result<()> {
    for collection in service.registry().resolve_names(names)? {
        let name = service.registry().get(&collection)?.name().to_string();
        info!(collection = %name, "Deleting");
        service.delete(&collection).await?;
        writeln!(out, "{name}: deleted")?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
