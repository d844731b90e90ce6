//! Dataset builder command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use squill_core::storage::{Store, Tier};
use squill_training::{BuildOptions, Strategy, build_dataset};

pub async fn execute(strategy: String, template: String) -> Result<()> {
    let layout = super::layout()?;
    let strategy: Strategy = strategy.parse()?;
    let gold = Store::open_tier(&layout, Tier::Gold).context("failed to open the gold store")?;

    let options = BuildOptions::new(strategy, template);
    let summary = build_dataset(&gold, &layout, &options).context("dataset build aborted")?;

    let out_dir = layout.training_dir(strategy.as_str(), options.template_stem());
    println!();
    println!("{}", "Dataset build complete".bold().green());
    println!(
        "  train ({}), valid ({}), test ({})",
        summary.train.to_string().cyan(),
        summary.valid.to_string().cyan(),
        summary.test.to_string().cyan()
    );
    if summary.skipped > 0 {
        println!("  Skipped: {}", summary.skipped.to_string().yellow());
    }
    println!("  Saved to {}", out_dir.display().to_string().dimmed());
    Ok(())
}
