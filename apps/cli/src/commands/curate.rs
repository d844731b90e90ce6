//! Curate command implementation.

use anyhow::{Context, Result};
use squill_core::curate;
use squill_core::storage::{Store, Tier};

pub async fn execute() -> Result<()> {
    let layout = super::layout()?;
    let silver =
        Store::open_tier(&layout, Tier::Silver).context("failed to open the silver store")?;
    let mut gold =
        Store::open_tier(&layout, Tier::Gold).context("failed to open the gold store")?;

    let report = curate::run(&silver, &mut gold).context("curate stage aborted")?;
    super::print_report("Curate", &report);
    Ok(())
}
