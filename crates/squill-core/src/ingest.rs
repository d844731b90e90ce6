//! Raw dataset ingestion into the bronze store.
//!
//! Errors are not caught here: a malformed record aborts the whole run, and
//! re-running against an already-populated store fails on the primary keys.

use crate::records::{DatasetRecord, NatSqlAnnotation, SpiderExample, SpiderSchema, Split};
use crate::storage::{DatasetRepository, NatSqlRepository, SchemaRepository, Store, StorageResult};
use std::path::Path;
use tracing::info;

/// Row counts per bronze table after one ingestion run.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestSummary {
    pub dataset_rows: usize,
    pub natsql_rows: usize,
    pub schema_rows: usize,
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> StorageResult<Vec<T>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Inserts one split's examples, assigning sequential identifiers.
pub fn insert_examples(
    repo: &DatasetRepository<'_>,
    split: Split,
    examples: &[SpiderExample],
) -> StorageResult<usize> {
    for (idx, example) in examples.iter().enumerate() {
        repo.insert(&DatasetRecord {
            id: idx as i64,
            db_id: example.db_id.clone(),
            source: split,
            question: example.question.clone(),
            question_toks: serde_json::to_string(&example.question_toks)?,
            query: example.query.clone(),
            query_toks: serde_json::to_string(&example.query_toks)?,
            query_toks_no_value: serde_json::to_string(&example.query_toks_no_value)?,
            sql_json: serde_json::to_string(&example.sql)?,
        })?;
    }
    Ok(examples.len())
}

/// Inserts one split's NatSQL annotations, aligned positionally with the
/// corresponding dataset file.
pub fn insert_natsql(
    repo: &NatSqlRepository<'_>,
    split: Split,
    annotations: &[NatSqlAnnotation],
) -> StorageResult<usize> {
    for (idx, annotation) in annotations.iter().enumerate() {
        repo.insert(idx as i64, split, &annotation.natsql)?;
    }
    Ok(annotations.len())
}

/// Inserts schema descriptors under a source label (`train_dev` or `test`).
pub fn insert_schemas(
    repo: &SchemaRepository<'_>,
    source: &str,
    schemas: &[SpiderSchema],
) -> StorageResult<usize> {
    for schema in schemas {
        repo.insert(schema, source)?;
    }
    Ok(schemas.len())
}

/// Runs the full ingestion stage: the three dataset splits, the NatSQL
/// annotations for train and dev, and both schema descriptor files.
pub fn run_from_dirs(
    bronze: &mut Store,
    spider_dir: &Path,
    natsql_dir: &Path,
) -> StorageResult<IngestSummary> {
    let mut summary = IngestSummary::default();

    bronze.transaction(|tx| {
        let datasets = DatasetRepository::new(tx);
        let natsql = NatSqlRepository::new(tx);
        let schemas = SchemaRepository::new(tx);

        for (file, split) in [
            ("train_spider.json", Split::Train),
            ("dev.json", Split::Dev),
            ("test.json", Split::Test),
        ] {
            let examples: Vec<SpiderExample> = load_json(&spider_dir.join(file))?;
            summary.dataset_rows += insert_examples(&datasets, split, &examples)?;
            info!(file, split = %split, rows = examples.len(), "ingested dataset file");
        }

        for (file, split) in [
            ("train_spider-natsql.json", Split::Train),
            ("dev-natsql.json", Split::Dev),
        ] {
            let annotations: Vec<NatSqlAnnotation> = load_json(&natsql_dir.join(file))?;
            summary.natsql_rows += insert_natsql(&natsql, split, &annotations)?;
            info!(file, split = %split, rows = annotations.len(), "ingested natsql file");
        }

        for (file, source) in [("tables.json", "train_dev"), ("test_tables.json", "test")] {
            let descriptors: Vec<SpiderSchema> = load_json(&spider_dir.join(file))?;
            summary.schema_rows += insert_schemas(&schemas, source, &descriptors)?;
            info!(file, source, rows = descriptors.len(), "ingested schema file");
        }

        Ok(())
    })?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Tier;

    fn example(db_id: &str, question: &str, query: &str) -> SpiderExample {
        serde_json::from_value(serde_json::json!({
            "db_id": db_id,
            "question": question,
            "query": query,
            "question_toks": question.split(' ').collect::<Vec<_>>(),
            "query_toks": [],
            "query_toks_no_value": [],
            "sql": {},
        }))
        .unwrap()
    }

    #[test]
    fn test_row_count_matches_source_array() {
        let store = Store::open_in_memory(Tier::Bronze.bundled_schema()).unwrap();
        let repo = DatasetRepository::new(store.conn());
        let examples = vec![
            example("farm", "How many farms are there?", "SELECT count(*) FROM farm"),
            example("farm", "List all farms.", "SELECT * FROM farm"),
            example("concert", "How many singers?", "SELECT count(*) FROM singer"),
        ];

        let inserted = insert_examples(&repo, Split::Train, &examples).unwrap();
        assert_eq!(inserted, examples.len());
        assert_eq!(repo.count().unwrap(), examples.len() as i64);
    }

    #[test]
    fn test_identifiers_are_sequential_per_split() {
        let store = Store::open_in_memory(Tier::Bronze.bundled_schema()).unwrap();
        let repo = DatasetRepository::new(store.conn());
        let examples =
            vec![example("farm", "q0", "SELECT 1"), example("farm", "q1", "SELECT 2")];
        insert_examples(&repo, Split::Train, &examples).unwrap();
        insert_examples(&repo, Split::Dev, &examples).unwrap();

        let rows = repo.fetch_all_with_natsql().unwrap();
        let train_ids: Vec<i64> =
            rows.iter().filter(|(r, _)| r.source == Split::Train).map(|(r, _)| r.id).collect();
        assert_eq!(train_ids, vec![0, 1]);
    }

    #[test]
    fn test_full_run_from_dirs() {
        let temp = tempfile::TempDir::new().unwrap();
        let spider_dir = temp.path().join("spider_data");
        let natsql_dir = temp.path().join("natsql");
        std::fs::create_dir_all(&spider_dir).unwrap();
        std::fs::create_dir_all(&natsql_dir).unwrap();

        let dataset = serde_json::json!([{
            "db_id": "farm",
            "question": "How many farms are there?",
            "question_toks": ["How", "many", "farms", "are", "there", "?"],
            "query": "SELECT count(*) FROM farm",
            "query_toks": ["SELECT", "count", "(", "*", ")", "FROM", "farm"],
            "query_toks_no_value": ["select", "count", "(", "*", ")", "from", "farm"],
            "sql": {}
        }]);
        for file in ["train_spider.json", "dev.json", "test.json"] {
            std::fs::write(spider_dir.join(file), dataset.to_string()).unwrap();
        }
        let natsql = serde_json::json!([{"NatSQL": "count farm"}]);
        for file in ["train_spider-natsql.json", "dev-natsql.json"] {
            std::fs::write(natsql_dir.join(file), natsql.to_string()).unwrap();
        }
        let tables = serde_json::json!([{
            "db_id": "farm",
            "table_names": ["farm"],
            "table_names_original": ["farm"],
            "column_names": [[-1, "*"], [0, "farm id"]],
            "column_names_original": [[-1, "*"], [0, "Farm_ID"]],
            "column_types": ["text", "number"],
            "primary_keys": [1],
            "foreign_keys": []
        }]);
        std::fs::write(spider_dir.join("tables.json"), tables.to_string()).unwrap();
        std::fs::write(spider_dir.join("test_tables.json"), tables.to_string()).unwrap();

        let mut bronze = Store::open_in_memory(Tier::Bronze.bundled_schema()).unwrap();
        let summary = run_from_dirs(&mut bronze, &spider_dir, &natsql_dir).unwrap();

        assert_eq!(summary.dataset_rows, 3);
        assert_eq!(summary.natsql_rows, 2);
        assert_eq!(summary.schema_rows, 2);
    }

    #[test]
    fn test_missing_input_aborts_run() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut bronze = Store::open_in_memory(Tier::Bronze.bundled_schema()).unwrap();
        let result = run_from_dirs(&mut bronze, temp.path(), temp.path());
        assert!(result.is_err());
    }
}
