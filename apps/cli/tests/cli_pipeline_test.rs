//! End-to-end tests for the squill binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn squill(root: &TempDir, tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("squill").unwrap();
    cmd.env("SQUILL_ROOT", root.path());
    cmd.env("SQUILL_TMP", tmp.path());
    cmd
}

fn seed_raw_data(tmp: &TempDir) {
    let spider_dir = tmp.path().join("spider_data");
    let natsql_dir = tmp.path().join("NatSQL").join("NatSQLv1_6");
    std::fs::create_dir_all(&spider_dir).unwrap();
    std::fs::create_dir_all(&natsql_dir).unwrap();

    let dataset = serde_json::json!([{
        "db_id": "t1",
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
        "db_id": "t1",
        "table_names": ["farm"],
        "table_names_original": ["farm"],
        "column_names": [[-1, "*"], [0, "farm id"]],
        "column_names_original": [[-1, "*"], [0, "Farm_ID"]],
        "column_types": ["text", "number"],
        "primary_keys": [1],
        "foreign_keys": []
    }]);
    std::fs::write(spider_dir.join("tables.json"), tables.to_string()).unwrap();
    std::fs::write(spider_dir.join("test_tables.json"), "[]").unwrap();
}

fn seed_template(root: &TempDir) {
    let template_dir = root.path().join("data").join("templates").join("nl2sql");
    std::fs::create_dir_all(&template_dir).unwrap();
    std::fs::write(template_dir.join("template_00.txt"), "{question}\n{schema_ddl}").unwrap();
}

#[test]
fn test_help_lists_pipeline_stages() {
    Command::cargo_bin("squill")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("benchmark"));
}

#[test]
fn test_missing_environment_is_fatal() {
    Command::cargo_bin("squill")
        .unwrap()
        .arg("refine")
        .env_remove("SQUILL_ROOT")
        .env_remove("SQUILL_TMP")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SQUILL_ROOT"));
}

#[test]
fn test_missing_required_flag_fails_before_processing() {
    Command::cargo_bin("squill")
        .unwrap()
        .args(["dataset", "--strategy", "nl2sql"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--template"));
}

#[test]
fn test_pipeline_through_mock_prediction() {
    let root = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();
    seed_raw_data(&tmp);
    seed_template(&root);

    squill(&root, &tmp).arg("ingest").assert().success();
    squill(&root, &tmp)
        .arg("refine")
        .assert()
        .success()
        .stdout(predicate::str::contains("Written: 3"));
    squill(&root, &tmp).arg("curate").assert().success();
    squill(&root, &tmp)
        .args(["dataset", "--strategy", "nl2sql", "--template", "template_00.txt"])
        .assert()
        .success();

    let train_jsonl = root
        .path()
        .join("data/training/nl2sql/template_00/train.jsonl");
    let contents = std::fs::read_to_string(&train_jsonl).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.contains("how many farms are there?"));
    // The completion is the gold query verbatim, i.e. the silver-normalized
    // form; the builder applies no normalization of its own.
    assert!(contents.contains("select count(*) from farm"));

    let valid_sql = root.path().join("data/training/nl2sql/template_00/valid.sql");
    let sql = std::fs::read_to_string(&valid_sql).unwrap();
    assert_eq!(sql, "select count(*) from farm\tt1\n");

    let pred_file = root.path().join("pred.sql");
    squill(&root, &tmp)
        .args([
            "predict",
            "--backend",
            "mock",
            "--strategy",
            "nl2sql",
            "--template",
            "template_00.txt",
            "--input-file",
            "valid",
            "--output-file",
            pred_file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successful:    1"));

    let predictions = std::fs::read_to_string(&pred_file).unwrap();
    assert_eq!(predictions.lines().count(), 1);
    assert!(predictions.starts_with("Mock response for:"));
}

#[test]
fn test_benchmark_requires_ingested_schemas() {
    let root = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();

    squill(&root, &tmp)
        .args([
            "benchmark",
            "--gold-file",
            "gold.sql",
            "--predict-file",
            "pred.sql",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no schema descriptors"));
}
