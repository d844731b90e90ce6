//! Repository implementations for the tier tables.
//!
//! Each repository borrows a connection (or an open transaction, which
//! derefs to one) and maps rows to the record types in `records`.

use crate::records::{DatasetRecord, Difficulty, EnrichedRecord, SpiderSchema, Split};
use crate::storage::error::StorageResult;
use rusqlite::{Connection, Row, params};

/// Parses a text column through `FromStr`, reporting a column-type error
/// with the offending column name on failure.
fn parse_text_field<T: std::str::FromStr>(
    row: &Row,
    idx: usize,
    column_name: &str,
) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    parse_str(&text, idx, column_name)
}

fn parse_optional_text_field<T: std::str::FromStr>(
    row: &Row,
    idx: usize,
    column_name: &str,
) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        Some(s) => parse_str(&s, idx, column_name).map(Some),
        None => Ok(None),
    }
}

fn parse_str<T: std::str::FromStr>(
    s: &str,
    idx: usize,
    column_name: &str,
) -> rusqlite::Result<T> {
    s.parse().map_err(|_| {
        rusqlite::Error::InvalidColumnType(
            idx,
            column_name.to_string(),
            rusqlite::types::Type::Text,
        )
    })
}

// ============================================================================
// Bronze: dataset rows
// ============================================================================

/// Repository for the bronze `spider_dataset` table.
pub struct DatasetRepository<'c> {
    conn: &'c Connection,
}

impl<'c> DatasetRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &DatasetRecord) -> StorageResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO spider_dataset
            (id, db_id, source, question, question_toks, query, query_toks, query_toks_no_value, sql_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.db_id,
                record.source.as_str(),
                record.question,
                record.question_toks,
                record.query,
                record.query_toks,
                record.query_toks_no_value,
                record.sql_json,
            ],
        )?;
        Ok(())
    }

    pub fn count(&self) -> StorageResult<i64> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM spider_dataset", [], |row| row.get(0))?)
    }

    /// Fetches every dataset row joined with its NatSQL annotation, ordered
    /// by split then id. Rows without an annotation carry `None`.
    pub fn fetch_all_with_natsql(&self) -> StorageResult<Vec<(DatasetRecord, Option<String>)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT d.id, d.db_id, d.source, d.question, d.question_toks,
                   d.query, d.query_toks, d.query_toks_no_value, d.sql_json, n.natsql
            FROM spider_dataset d
            LEFT JOIN spider_natsql n ON d.id = n.id AND d.source = n.source
            ORDER BY d.source, d.id
            "#,
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push((Self::row_to_record(row)?, row.get(9)?));
        }
        Ok(out)
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<DatasetRecord> {
        Ok(DatasetRecord {
            id: row.get(0)?,
            db_id: row.get(1)?,
            source: parse_text_field::<Split>(row, 2, "source")?,
            question: row.get(3)?,
            question_toks: row.get(4)?,
            query: row.get(5)?,
            query_toks: row.get(6)?,
            query_toks_no_value: row.get(7)?,
            sql_json: row.get(8)?,
        })
    }
}

// ============================================================================
// Bronze: NatSQL annotations
// ============================================================================

/// Repository for the bronze `spider_natsql` table.
pub struct NatSqlRepository<'c> {
    conn: &'c Connection,
}

impl<'c> NatSqlRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, id: i64, source: Split, natsql: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO spider_natsql (id, source, natsql) VALUES (?1, ?2, ?3)",
            params![id, source.as_str(), natsql],
        )?;
        Ok(())
    }

    pub fn count(&self) -> StorageResult<i64> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM spider_natsql", [], |row| row.get(0))?)
    }
}

// ============================================================================
// Bronze: schema descriptors
// ============================================================================

/// Repository for the bronze `spider_tables` table. Structured fields are
/// stored as JSON text and parsed back on read.
pub struct SchemaRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SchemaRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, schema: &SpiderSchema, source: &str) -> StorageResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO spider_tables
            (db_id, source, table_names, table_names_original,
             column_names, column_names_original,
             column_types, primary_keys, foreign_keys)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                schema.db_id,
                source,
                serde_json::to_string(&schema.table_names)?,
                serde_json::to_string(&schema.table_names_original)?,
                serde_json::to_string(&schema.column_names)?,
                serde_json::to_string(&schema.column_names_original)?,
                serde_json::to_string(&schema.column_types)?,
                serde_json::to_string(&schema.primary_keys)?,
                serde_json::to_string(&schema.foreign_keys)?,
            ],
        )?;
        Ok(())
    }

    pub fn count(&self) -> StorageResult<i64> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM spider_tables", [], |row| row.get(0))?)
    }

    /// Fetches the first descriptor for a database identifier.
    pub fn get_by_db_id(&self, db_id: &str) -> StorageResult<Option<SpiderSchema>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT db_id, table_names, table_names_original, column_names,
                   column_names_original, column_types, primary_keys, foreign_keys
            FROM spider_tables WHERE db_id = ?1
            "#,
        )?;
        let mut rows = stmt.query(params![db_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_schema(row)?))
        } else {
            Ok(None)
        }
    }

    /// Fetches every stored descriptor, deserializing the JSON fields. The
    /// benchmark stage serializes this list back into the tables document
    /// the external evaluator expects.
    pub fn get_all(&self) -> StorageResult<Vec<SpiderSchema>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT db_id, table_names, table_names_original, column_names,
                   column_names_original, column_types, primary_keys, foreign_keys
            FROM spider_tables
            "#,
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(Self::row_to_schema(row)?);
        }
        Ok(out)
    }

    fn row_to_schema(row: &Row) -> rusqlite::Result<SpiderSchema> {
        fn json_field<T: serde::de::DeserializeOwned>(
            row: &Row,
            idx: usize,
            column_name: &str,
        ) -> rusqlite::Result<T> {
            let text: String = row.get(idx)?;
            serde_json::from_str(&text).map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    idx,
                    column_name.to_string(),
                    rusqlite::types::Type::Text,
                )
            })
        }

        Ok(SpiderSchema {
            db_id: row.get(0)?,
            table_names: json_field(row, 1, "table_names")?,
            table_names_original: json_field(row, 2, "table_names_original")?,
            column_names: json_field(row, 3, "column_names")?,
            column_names_original: json_field(row, 4, "column_names_original")?,
            column_types: json_field(row, 5, "column_types")?,
            primary_keys: json_field(row, 6, "primary_keys")?,
            foreign_keys: json_field(row, 7, "foreign_keys")?,
        })
    }
}

// ============================================================================
// Silver/gold: enriched rows
// ============================================================================

/// Repository for the silver and gold tables, which share one row shape.
pub struct EnrichedRepository<'c> {
    conn: &'c Connection,
    table: &'static str,
}

impl<'c> EnrichedRepository<'c> {
    pub fn silver(conn: &'c Connection) -> Self {
        Self { conn, table: "silver_dataset" }
    }

    pub fn gold(conn: &'c Connection) -> Self {
        Self { conn, table: "gold_dataset" }
    }

    pub fn insert(&self, record: &EnrichedRecord) -> StorageResult<()> {
        self.conn.execute(
            &format!(
                r#"
                INSERT INTO {} (
                    id, db_id, source, question, query, query_toks_no_value, sql_json,
                    simplified_ddl, full_ddl, foreign_keys, difficulty, natsql, is_valid, notes
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
                self.table
            ),
            params![
                record.id,
                record.db_id,
                record.source.as_str(),
                record.question,
                record.query,
                record.query_toks_no_value,
                record.sql_json,
                record.simplified_ddl,
                record.full_ddl,
                record.foreign_keys,
                record.difficulty.map(Difficulty::as_str),
                record.natsql,
                record.is_valid,
                record.notes,
            ],
        )?;
        Ok(())
    }

    pub fn count(&self) -> StorageResult<i64> {
        Ok(self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?)
    }

    pub fn fetch_all(&self) -> StorageResult<Vec<EnrichedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY source, id",
            Self::select_clause(self.table)
        ))?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(Self::row_to_record(row)?);
        }
        Ok(out)
    }

    pub fn fetch_by_split(&self, split: Split) -> StorageResult<Vec<EnrichedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE source = ?1 ORDER BY id",
            Self::select_clause(self.table)
        ))?;
        let mut rows = stmt.query(params![split.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(Self::row_to_record(row)?);
        }
        Ok(out)
    }

    fn select_clause(table: &str) -> String {
        format!(
            r#"
            SELECT id, db_id, source, question, query, query_toks_no_value, sql_json,
                   simplified_ddl, full_ddl, foreign_keys, difficulty, natsql, is_valid, notes
            FROM {table}
            "#
        )
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<EnrichedRecord> {
        Ok(EnrichedRecord {
            id: row.get(0)?,
            db_id: row.get(1)?,
            source: parse_text_field::<Split>(row, 2, "source")?,
            question: row.get(3)?,
            query: row.get(4)?,
            query_toks_no_value: row.get(5)?,
            sql_json: row.get(6)?,
            simplified_ddl: row.get(7)?,
            full_ddl: row.get(8)?,
            foreign_keys: row.get(9)?,
            difficulty: parse_optional_text_field::<Difficulty>(row, 10, "difficulty")?,
            natsql: row.get(11)?,
            is_valid: row.get(12)?,
            notes: row.get(13)?,
        })
    }
}
