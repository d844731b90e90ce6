//! Squill Core
//!
//! Data-tier primitives for the NL-to-SQL fine-tuning pipeline:
//! - Pipeline environment and filesystem layout (`config`)
//! - Bronze/silver/gold SQLite stores and repositories (`storage`)
//! - Raw dataset ingestion (`ingest`)
//! - Cleaning, schema-context derivation, difficulty annotation (`refine`)
//! - Silver-to-gold curation (`curate`)

pub mod config;
pub mod curate;
pub mod eval;
pub mod ingest;
pub mod records;
pub mod refine;
pub mod report;
pub mod storage;

pub use config::{Layout, ROOT_ENV, TMP_ENV};
pub use eval::classify_difficulty;
pub use records::{DatasetRecord, Difficulty, EnrichedRecord, SpiderExample, SpiderSchema, Split};
pub use report::{SkippedRecord, StageReport};
pub use storage::{
    DatasetRepository, EnrichedRepository, NatSqlRepository, SchemaRepository, Store, StorageError,
    StorageResult,
};
