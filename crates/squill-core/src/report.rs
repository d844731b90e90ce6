//! Per-stage batch reports.

use crate::records::Split;
use serde::Serialize;

/// A record the stage could not process. The batch continues past these;
/// the identifier and reason are enough to locate and fix the input.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub id: i64,
    pub source: Split,
    pub reason: String,
}

/// Outcome of one linear pass over a tier.
#[derive(Debug, Default, Serialize)]
pub struct StageReport {
    pub written: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl StageReport {
    pub fn record_skip(&mut self, id: i64, source: Split, reason: impl Into<String>) {
        self.skipped.push(SkippedRecord { id, source, reason: reason.into() });
    }
}
