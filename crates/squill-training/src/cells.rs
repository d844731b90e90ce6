//! Live cell-value sampling.
//!
//! Opens a record's actual per-database SQLite file and pulls up to a few
//! example values per column per table, formatted one table per line as
//! `table(col[v1, v2, v3], ...)`.

use crate::error::TrainingResult;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

/// Samples up to `max_samples` values per column from every table in the
/// database file. Tables keep their `sqlite_master` order; a table without
/// rows lists its columns with empty sample brackets.
pub fn sample_cell_values(db_path: &Path, max_samples: usize) -> TrainingResult<String> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let tables: Vec<String> =
        stmt.query_map([], |row| row.get(0))?.collect::<Result<_, _>>()?;

    let mut formatted_tables = Vec::with_capacity(tables.len());

    for table in &tables {
        let quoted = quote_identifier(table);

        let mut info = conn.prepare(&format!("PRAGMA table_info({quoted})"))?;
        let columns: Vec<String> =
            info.query_map([], |row| row.get::<_, String>(1))?.collect::<Result<_, _>>()?;

        let mut select = conn.prepare(&format!("SELECT * FROM {quoted} LIMIT {max_samples}"))?;
        let column_count = select.column_count();
        let mut rows = select.query([])?;

        // Transpose sampled rows into per-column value lists.
        let mut samples: Vec<Vec<String>> = vec![Vec::new(); column_count];
        while let Some(row) = rows.next()? {
            for (idx, slot) in samples.iter_mut().enumerate() {
                slot.push(value_to_text(row.get_ref(idx)?));
            }
        }

        let col_strs: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let values = samples.get(idx).map_or(&[][..], Vec::as_slice);
                format!("{col}[{}]", values.join(", "))
            })
            .collect();
        formatted_tables.push(format!("{table}({})", col_strs.join(", ")));
    }

    Ok(formatted_tables.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed_db(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("farm.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE farm (Farm_ID INTEGER, Year INTEGER, Cows REAL);
            INSERT INTO farm VALUES (1, 1927, 110.5);
            INSERT INTO farm VALUES (2, 1928, 120.0);
            INSERT INTO farm VALUES (3, 1929, 135.25);
            INSERT INTO farm VALUES (4, 1930, 145.0);
            CREATE TABLE city (City_ID INTEGER, Name TEXT);
            "#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_samples_limited_and_formatted() {
        let temp = TempDir::new().unwrap();
        let path = seed_db(&temp);

        let samples = sample_cell_values(&path, 3).unwrap();
        let lines: Vec<&str> = samples.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "farm(Farm_ID[1, 2, 3], Year[1927, 1928, 1929], Cows[110.5, 120, 135.25])");
        assert_eq!(lines[1], "city(City_ID[], Name[])");
    }

    #[test]
    fn test_missing_database_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(sample_cell_values(&temp.path().join("nope.sqlite"), 3).is_err());
    }
}
