//! Ingestion command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use squill_core::ingest;
use squill_core::storage::{Store, Tier};
use std::path::PathBuf;

pub async fn execute(spider_dir: Option<PathBuf>, natsql_dir: Option<PathBuf>) -> Result<()> {
    let layout = super::layout()?;
    let mut bronze =
        Store::open_tier(&layout, Tier::Bronze).context("failed to open the bronze store")?;

    let spider_dir = spider_dir.unwrap_or_else(|| layout.raw_spider_dir());
    let natsql_dir = natsql_dir.unwrap_or_else(|| layout.raw_natsql_dir());

    let summary = ingest::run_from_dirs(&mut bronze, &spider_dir, &natsql_dir)
        .context("ingestion aborted")?;

    println!();
    println!("{}", "Ingestion complete".bold().green());
    println!("  Dataset rows: {}", summary.dataset_rows.to_string().cyan());
    println!("  NatSQL rows:  {}", summary.natsql_rows.to_string().cyan());
    println!("  Schema rows:  {}", summary.schema_rows.to_string().cyan());
    println!("  Store: {}", layout.bronze_db().display().to_string().dimmed());
    Ok(())
}
