//! Refine command implementation.

use anyhow::{Context, Result};
use squill_core::refine;
use squill_core::storage::{Store, Tier};

pub async fn execute() -> Result<()> {
    let layout = super::layout()?;
    let bronze =
        Store::open_tier(&layout, Tier::Bronze).context("failed to open the bronze store")?;
    let mut silver =
        Store::open_tier(&layout, Tier::Silver).context("failed to open the silver store")?;

    let report = refine::run(&bronze, &mut silver).context("refine stage aborted")?;
    super::print_report("Refine", &report);
    Ok(())
}
