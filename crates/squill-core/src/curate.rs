//! Silver-to-gold curation.
//!
//! Copies every silver row into the gold store unchanged, carrying the
//! hand-edited `is_valid`/`notes` fields. There is no automated validity
//! gate; review happens in the silver store between runs.

use crate::report::StageReport;
use crate::storage::{EnrichedRepository, Store, StorageResult};
use tracing::warn;

/// Runs the curation stage: silver rows in, gold rows out.
pub fn run(silver: &Store, gold: &mut Store) -> StorageResult<StageReport> {
    let rows = EnrichedRepository::silver(silver.conn()).fetch_all()?;
    let mut report = StageReport::default();

    gold.transaction(|tx| {
        let repo = EnrichedRepository::gold(tx);
        for record in rows {
            if let Err(e) = repo.insert(&record) {
                warn!(id = record.id, source = %record.source, error = %e,
                      "skipping record: gold insert failed");
                report.record_skip(record.id, record.source, e.to_string());
                continue;
            }
            report.written += 1;
        }
        Ok(())
    })?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Difficulty, EnrichedRecord, Split};
    use crate::storage::Tier;

    fn silver_record(id: i64, is_valid: bool, notes: Option<&str>) -> EnrichedRecord {
        EnrichedRecord {
            id,
            db_id: "farm".to_string(),
            source: Split::Train,
            question: "how many farms are there?".to_string(),
            query: "select count(*) from farm".to_string(),
            query_toks_no_value: "[]".to_string(),
            sql_json: "{}".to_string(),
            simplified_ddl: "[\"farm(Farm_ID)\"]".to_string(),
            full_ddl: "[\"CREATE TABLE farm(Farm_ID number);\"]".to_string(),
            foreign_keys: "[]".to_string(),
            difficulty: Some(Difficulty::Easy),
            natsql: None,
            is_valid,
            notes: notes.map(str::to_string),
        }
    }

    #[test]
    fn test_copies_rows_with_review_fields() {
        let silver = Store::open_in_memory(Tier::Silver.bundled_schema()).unwrap();
        let repo = EnrichedRepository::silver(silver.conn());
        repo.insert(&silver_record(0, true, Some("looks right"))).unwrap();
        repo.insert(&silver_record(1, false, None)).unwrap();

        let mut gold = Store::open_in_memory(Tier::Gold.bundled_schema()).unwrap();
        let report = run(&silver, &mut gold).unwrap();
        assert_eq!(report.written, 2);
        assert!(report.skipped.is_empty());

        let rows = EnrichedRepository::gold(gold.conn()).fetch_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_valid);
        assert_eq!(rows[0].notes.as_deref(), Some("looks right"));
        assert!(!rows[1].is_valid);
    }

    #[test]
    fn test_duplicate_gold_row_is_skipped_not_fatal() {
        let silver = Store::open_in_memory(Tier::Silver.bundled_schema()).unwrap();
        EnrichedRepository::silver(silver.conn())
            .insert(&silver_record(0, false, None))
            .unwrap();

        let mut gold = Store::open_in_memory(Tier::Gold.bundled_schema()).unwrap();
        EnrichedRepository::gold(gold.conn()).insert(&silver_record(0, false, None)).unwrap();

        let report = run(&silver, &mut gold).unwrap();
        assert_eq!(report.written, 0);
        assert_eq!(report.skipped.len(), 1);
    }
}
