//! Human-readable schema context derived from a schema descriptor.
//!
//! Derivation is pure: the same descriptor always yields byte-identical
//! output. Original table and column spellings are used, never the
//! normalized display names.

use crate::records::SpiderSchema;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("column index {0} out of range in foreign key pair")]
    ColumnIndex(usize),

    #[error("table index {0} out of range for column {1}")]
    TableIndex(i64, String),
}

/// The three derived context strings, each a JSON array of strings as
/// stored in the silver and gold tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaContext {
    pub simplified_ddl: String,
    pub full_ddl: String,
    pub foreign_keys: String,
}

impl SchemaContext {
    /// The context written when no descriptor exists for a database:
    /// empty strings, distinguishable from a present-but-keyless `"[]"`.
    #[must_use]
    pub fn missing() -> Self {
        Self {
            simplified_ddl: String::new(),
            full_ddl: String::new(),
            foreign_keys: String::new(),
        }
    }
}

/// Derives the schema context for one descriptor.
///
/// Columns are attached to tables through their owning-table index; the `*`
/// pseudo-column (index -1) is skipped. Tables keep their descriptor order,
/// and a table without columns still appears with an empty list.
pub fn derive(schema: &SpiderSchema) -> Result<SchemaContext, ContextError> {
    let tables = &schema.table_names_original;
    let mut columns: Vec<Vec<(String, String)>> = vec![Vec::new(); tables.len()];

    for (idx, (table_idx, name)) in schema.column_names_original.iter().enumerate() {
        if *table_idx < 0 {
            continue;
        }
        let slot = columns
            .get_mut(*table_idx as usize)
            .ok_or_else(|| ContextError::TableIndex(*table_idx, name.clone()))?;
        let column_type = schema.column_types.get(idx).cloned().unwrap_or_default();
        slot.push((name.clone(), column_type));
    }

    let simplified: Vec<String> = tables
        .iter()
        .zip(&columns)
        .map(|(table, cols)| {
            let names: Vec<&str> = cols.iter().map(|(name, _)| name.as_str()).collect();
            format!("{table}({})", names.join(", "))
        })
        .collect();

    let full: Vec<String> = tables
        .iter()
        .zip(&columns)
        .map(|(table, cols)| {
            let defs: Vec<String> =
                cols.iter().map(|(name, ty)| format!("{name} {ty}")).collect();
            format!("CREATE TABLE {table}({});", defs.join(", "))
        })
        .collect();

    let mut fk_list = Vec::with_capacity(schema.foreign_keys.len());
    for &(src, dst) in &schema.foreign_keys {
        let (src_table, src_col) = column_ref(schema, src)?;
        let (dst_table, dst_col) = column_ref(schema, dst)?;
        fk_list.push(format!("{src_table}({src_col}) REFERENCES {dst_table}({dst_col})"));
    }

    Ok(SchemaContext {
        simplified_ddl: to_json(&simplified),
        full_ddl: to_json(&full),
        foreign_keys: to_json(&fk_list),
    })
}

fn column_ref(schema: &SpiderSchema, index: usize) -> Result<(&str, &str), ContextError> {
    let (table_idx, name) = schema
        .column_names_original
        .get(index)
        .ok_or(ContextError::ColumnIndex(index))?;
    let table = schema
        .table_names_original
        .get(usize::try_from(*table_idx).map_err(|_| ContextError::TableIndex(*table_idx, name.clone()))?)
        .ok_or_else(|| ContextError::TableIndex(*table_idx, name.clone()))?;
    Ok((table.as_str(), name.as_str()))
}

fn to_json(items: &[String]) -> String {
    // Serializing a Vec<String> cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
