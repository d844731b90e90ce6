//! One module per pipeline stage.

pub mod benchmark;
pub mod curate;
pub mod dataset;
pub mod finetune;
pub mod ingest;
pub mod predict;
pub mod refine;

use anyhow::{Context, Result};
use colored::Colorize;
use squill_core::report::StageReport;
use squill_core::Layout;

/// Loads the pipeline layout, turning a missing variable into a fatal
/// startup error before any data is touched.
pub fn layout() -> Result<Layout> {
    Layout::from_env().context("pipeline environment is not configured")
}

/// Strips the extension from a template file name for output paths.
pub fn template_stem(template: &str) -> &str {
    std::path::Path::new(template)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(template)
}

/// Prints a stage report: the written count plus one line per skip.
pub fn print_report(stage: &str, report: &StageReport) {
    println!();
    println!("{}", format!("{stage} complete").bold().green());
    println!("  Written: {}", report.written.to_string().cyan());
    if report.skipped.is_empty() {
        return;
    }
    println!("  Skipped: {}", report.skipped.len().to_string().yellow());
    for skip in &report.skipped {
        println!(
            "    {}",
            format!("[{}:{}] {}", skip.source, skip.id, skip.reason).dimmed()
        );
    }
}
