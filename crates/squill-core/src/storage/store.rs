//! Store connection and schema management.

use crate::config::Layout;
use crate::storage::error::StorageResult;
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Data tier, used to resolve the store file and its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    /// Bundled schema text, used when the workspace carries no
    /// `schema.sql` next to the store file.
    #[must_use]
    pub fn bundled_schema(self) -> &'static str {
        match self {
            Tier::Bronze => include_str!("../../schemas/bronze.sql"),
            Tier::Silver => include_str!("../../schemas/silver.sql"),
            Tier::Gold => include_str!("../../schemas/gold.sql"),
        }
    }

    fn db_path(self, layout: &Layout) -> std::path::PathBuf {
        match self {
            Tier::Bronze => layout.bronze_db(),
            Tier::Silver => layout.silver_db(),
            Tier::Gold => layout.gold_db(),
        }
    }

    fn schema_file(self, layout: &Layout) -> std::path::PathBuf {
        match self {
            Tier::Bronze => layout.bronze_schema_file(),
            Tier::Silver => layout.silver_schema_file(),
            Tier::Gold => layout.gold_schema_file(),
        }
    }
}

/// Store connection wrapper.
///
/// Opens one tier's SQLite file, creates its parent directory, and applies
/// the tier schema (from the workspace `schema.sql` when present, otherwise
/// the bundled copy). Connections are opened at the start of a stage and
/// closed when the `Store` drops at the end of it.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens the store for a tier inside a pipeline layout.
    pub fn open_tier(layout: &Layout, tier: Tier) -> StorageResult<Self> {
        let schema_file = tier.schema_file(layout);
        let schema_sql = if schema_file.exists() {
            std::fs::read_to_string(&schema_file)?
        } else {
            tier.bundled_schema().to_string()
        };
        Self::open(&tier.db_path(layout), &schema_sql)
    }

    /// Opens a store at an explicit path with the given schema SQL.
    pub fn open(path: &Path, schema_sql: &str) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.apply_schema(schema_sql)?;
        Ok(store)
    }

    /// Opens an in-memory store for testing.
    pub fn open_in_memory(schema_sql: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.apply_schema(schema_sql)?;
        Ok(store)
    }

    fn apply_schema(&self, schema_sql: &str) -> StorageResult<()> {
        info!("applying store schema");
        self.conn.execute_batch(schema_sql)?;
        Ok(())
    }

    /// Gets a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Runs a closure inside a transaction, committing once at the end.
    ///
    /// Bulk stages use this for their single end-of-run commit.
    pub fn transaction<F, R>(&mut self, f: F) -> StorageResult<R>
    where
        F: FnOnce(&rusqlite::Transaction) -> StorageResult<R>,
    {
        let tx = self.conn.transaction()?;
        match f(&tx) {
            Ok(result) => {
                tx.commit()?;
                Ok(result)
            }
            Err(e) => {
                tx.rollback()?;
                Err(e)
            }
        }
    }
}
