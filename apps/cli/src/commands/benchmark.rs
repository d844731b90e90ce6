//! Benchmark command implementation.
//!
//! Reconstructs the evaluator's tables document (the foreign-key map input)
//! from the bronze schema rows, invokes the external evaluation tool, and
//! captures its stdout report to a file.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use squill_core::storage::{SchemaRepository, Store, Tier};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

pub async fn execute(
    gold_file: PathBuf,
    predict_file: PathBuf,
    output_file: Option<PathBuf>,
    evaluator_cmd: String,
) -> Result<()> {
    let layout = super::layout()?;
    let bronze =
        Store::open_tier(&layout, Tier::Bronze).context("failed to open the bronze store")?;

    let schemas = SchemaRepository::new(bronze.conn())
        .get_all()
        .context("failed to read schema descriptors")?;
    if schemas.is_empty() {
        bail!("bronze store has no schema descriptors; run `squill ingest` first");
    }

    let mut tables_file = tempfile::Builder::new()
        .prefix("squill_tables_")
        .suffix(".json")
        .tempfile()
        .context("failed to create the tables document")?;
    tables_file.write_all(serde_json::to_string_pretty(&schemas)?.as_bytes())?;
    tables_file.flush()?;

    let mut parts = evaluator_cmd.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("evaluator command is empty");
    };

    println!("Evaluating {} against {}", predict_file.display(), gold_file.display());
    let output = Command::new(program)
        .args(parts)
        .arg("--gold")
        .arg(&gold_file)
        .arg("--pred")
        .arg(&predict_file)
        .arg("--db")
        .arg(layout.spider_databases())
        .arg("--table")
        .arg(tables_file.path())
        .arg("--etype")
        .arg("all")
        .output()
        .with_context(|| format!("failed to launch the evaluation tool: {evaluator_cmd}"))?;

    if !output.status.success() {
        bail!(
            "evaluation tool exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let report_path =
        output_file.unwrap_or_else(|| layout.reports_dir().join("eval_results.txt"));
    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&report_path, &output.stdout)
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    println!();
    println!("{}", "Benchmark complete".bold().green());
    println!("  Report: {}", report_path.display().to_string().cyan());
    Ok(())
}
