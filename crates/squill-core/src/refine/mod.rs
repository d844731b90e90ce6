//! Bronze-to-silver cleaning and annotation.
//!
//! One linear pass over the bronze rows. A query the classifier cannot
//! parse still produces a silver row (with an absent difficulty); any other
//! per-record failure is recorded as a skip and the batch continues.

pub mod schema_context;

use crate::eval::classify_difficulty;
use crate::records::{EnrichedRecord, SpiderSchema};
use crate::report::StageReport;
use crate::storage::{DatasetRepository, EnrichedRepository, SchemaRepository, Store, StorageResult};
use std::collections::HashMap;
use tracing::warn;

pub use schema_context::{ContextError, SchemaContext};

/// Lowercases and trims a question.
#[must_use]
pub fn clean_question(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Lowercases a query and collapses all internal whitespace runs to single
/// spaces.
#[must_use]
pub fn normalize_sql(sql: &str) -> String {
    sql.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Runs the refine stage: bronze rows in, silver rows out.
pub fn run(bronze: &Store, silver: &mut Store) -> StorageResult<StageReport> {
    let datasets = DatasetRepository::new(bronze.conn());
    let rows = datasets.fetch_all_with_natsql()?;

    // Descriptors are keyed by db_id; first row wins, matching lookup order.
    let mut descriptors: HashMap<String, SpiderSchema> = HashMap::new();
    for schema in SchemaRepository::new(bronze.conn()).get_all()? {
        descriptors.entry(schema.db_id.clone()).or_insert(schema);
    }

    let mut report = StageReport::default();

    silver.transaction(|tx| {
        let repo = EnrichedRepository::silver(tx);

        for (record, natsql) in rows {
            let context = match descriptors.get(&record.db_id) {
                Some(schema) => match schema_context::derive(schema) {
                    Ok(context) => context,
                    Err(e) => {
                        warn!(id = record.id, source = %record.source, db_id = %record.db_id,
                              error = %e, "skipping record: schema context derivation failed");
                        report.record_skip(record.id, record.source, e.to_string());
                        continue;
                    }
                },
                None => SchemaContext::missing(),
            };

            let difficulty = match classify_difficulty(&record.query) {
                Ok(difficulty) => Some(difficulty),
                Err(e) => {
                    warn!(id = record.id, db_id = %record.db_id, error = %e,
                          "difficulty unavailable for record");
                    None
                }
            };

            let enriched = EnrichedRecord {
                id: record.id,
                db_id: record.db_id.clone(),
                source: record.source,
                question: clean_question(&record.question),
                query: normalize_sql(&record.query),
                query_toks_no_value: record.query_toks_no_value.clone(),
                sql_json: record.sql_json.clone(),
                simplified_ddl: context.simplified_ddl,
                full_ddl: context.full_ddl,
                foreign_keys: context.foreign_keys,
                difficulty,
                natsql,
                is_valid: false,
                notes: None,
            };

            if let Err(e) = repo.insert(&enriched) {
                warn!(id = record.id, source = %record.source, error = %e,
                      "skipping record: silver insert failed");
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
    use crate::records::{DatasetRecord, Difficulty, Split};
    use crate::storage::Tier;

    fn seed_bronze() -> Store {
        let store = Store::open_in_memory(Tier::Bronze.bundled_schema()).unwrap();
        DatasetRepository::new(store.conn())
            .insert(&DatasetRecord {
                id: 0,
                db_id: "t1".to_string(),
                source: Split::Train,
                question: "How many farms are there?".to_string(),
                question_toks: "[]".to_string(),
                query: "SELECT count(*) FROM farm".to_string(),
                query_toks: "[]".to_string(),
                query_toks_no_value: "[]".to_string(),
                sql_json: "{}".to_string(),
            })
            .unwrap();
        SchemaRepository::new(store.conn())
            .insert(
                &SpiderSchema {
                    db_id: "t1".to_string(),
                    table_names: vec!["farm".to_string()],
                    table_names_original: vec!["farm".to_string()],
                    column_names: vec![],
                    column_names_original: vec![(-1, "*".to_string()), (0, "Farm_ID".to_string())],
                    column_types: vec!["text".to_string(), "number".to_string()],
                    primary_keys: vec![1],
                    foreign_keys: vec![],
                },
                "train_dev",
            )
            .unwrap();
        store
    }

    #[test]
    fn test_clean_question() {
        assert_eq!(clean_question("  How many Farms?  "), "how many farms?");
    }

    #[test]
    fn test_normalize_sql() {
        assert_eq!(
            normalize_sql("  SELECT   count(*)\n FROM\tfarm "),
            "select count(*) from farm"
        );
    }

    #[test]
    fn test_farm_record_end_to_end() {
        let bronze = seed_bronze();
        let mut silver = Store::open_in_memory(Tier::Silver.bundled_schema()).unwrap();

        let report = run(&bronze, &mut silver).unwrap();
        assert_eq!(report.written, 1);
        assert!(report.skipped.is_empty());

        let rows = EnrichedRepository::silver(silver.conn()).fetch_all().unwrap();
        let row = &rows[0];
        assert_eq!(row.question, "how many farms are there?");
        assert_eq!(row.query, "select count(*) from farm");
        assert!(row.simplified_ddl.contains("farm("));
        assert_eq!(row.foreign_keys, "[]");
        assert_eq!(row.difficulty, Some(Difficulty::Easy));
        assert!(!row.is_valid);
    }

    #[test]
    fn test_unparseable_query_keeps_record_without_difficulty() {
        let bronze = seed_bronze();
        DatasetRepository::new(bronze.conn())
            .insert(&DatasetRecord {
                id: 1,
                db_id: "t1".to_string(),
                source: Split::Train,
                question: "Broken".to_string(),
                question_toks: "[]".to_string(),
                query: "SELEC nmae FRM farm".to_string(),
                query_toks: "[]".to_string(),
                query_toks_no_value: "[]".to_string(),
                sql_json: "{}".to_string(),
            })
            .unwrap();
        let mut silver = Store::open_in_memory(Tier::Silver.bundled_schema()).unwrap();

        let report = run(&bronze, &mut silver).unwrap();
        assert_eq!(report.written, 2);

        let rows = EnrichedRepository::silver(silver.conn()).fetch_all().unwrap();
        let broken = rows.iter().find(|r| r.id == 1).unwrap();
        assert_eq!(broken.difficulty, None);
    }

    #[test]
    fn test_missing_descriptor_yields_empty_context() {
        let bronze = Store::open_in_memory(Tier::Bronze.bundled_schema()).unwrap();
        DatasetRepository::new(bronze.conn())
            .insert(&DatasetRecord {
                id: 0,
                db_id: "nowhere".to_string(),
                source: Split::Dev,
                question: "q".to_string(),
                question_toks: "[]".to_string(),
                query: "SELECT 1".to_string(),
                query_toks: "[]".to_string(),
                query_toks_no_value: "[]".to_string(),
                sql_json: "{}".to_string(),
            })
            .unwrap();
        let mut silver = Store::open_in_memory(Tier::Silver.bundled_schema()).unwrap();

        let report = run(&bronze, &mut silver).unwrap();
        assert_eq!(report.written, 1);

        let rows = EnrichedRepository::silver(silver.conn()).fetch_all().unwrap();
        assert_eq!(rows[0].simplified_ddl, "");
        assert_eq!(rows[0].foreign_keys, "");
    }

    #[test]
    fn test_schema_derivation_failure_is_a_skip() {
        let bronze = seed_bronze();
        // Corrupt descriptor for a second database.
        SchemaRepository::new(bronze.conn())
            .insert(
                &SpiderSchema {
                    db_id: "t2".to_string(),
                    table_names: vec!["a".to_string()],
                    table_names_original: vec!["a".to_string()],
                    column_names: vec![],
                    column_names_original: vec![(0, "x".to_string())],
                    column_types: vec!["text".to_string()],
                    primary_keys: vec![],
                    foreign_keys: vec![(42, 0)],
                },
                "train_dev",
            )
            .unwrap();
        DatasetRepository::new(bronze.conn())
            .insert(&DatasetRecord {
                id: 1,
                db_id: "t2".to_string(),
                source: Split::Train,
                question: "q".to_string(),
                question_toks: "[]".to_string(),
                query: "SELECT x FROM a".to_string(),
                query_toks: "[]".to_string(),
                query_toks_no_value: "[]".to_string(),
                sql_json: "{}".to_string(),
            })
            .unwrap();
        let mut silver = Store::open_in_memory(Tier::Silver.bundled_schema()).unwrap();

        let report = run(&bronze, &mut silver).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].id, 1);
    }
}
