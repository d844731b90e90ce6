//! Record types shared across the data tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dataset split label. Stored as text in every tier; the builder renames
/// `dev` to `valid` only in output file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Dev,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Dev, Split::Test];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev => "dev",
            Split::Test => "test",
        }
    }

    /// File stem used for rendered dataset files (`dev` becomes `valid`).
    #[must_use]
    pub fn file_stem(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev => "valid",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Split::Train),
            "dev" => Ok(Split::Dev),
            "test" => Ok(Split::Test),
            other => Err(format!("unknown split label: {other}")),
        }
    }
}

/// Query difficulty bucket, ordered easiest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Extra,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Extra => "extra",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "extra" => Ok(Difficulty::Extra),
            other => Err(format!("unknown difficulty bucket: {other}")),
        }
    }
}

/// One question/query pair as it appears in the raw dataset JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct SpiderExample {
    pub db_id: String,
    pub question: String,
    #[serde(default)]
    pub question_toks: Vec<String>,
    pub query: String,
    #[serde(default)]
    pub query_toks: Vec<String>,
    #[serde(default)]
    pub query_toks_no_value: Vec<String>,
    #[serde(default)]
    pub sql: serde_json::Value,
}

/// One NatSQL annotation, positionally aligned with its dataset file.
#[derive(Debug, Clone, Deserialize)]
pub struct NatSqlAnnotation {
    #[serde(rename = "NatSQL")]
    pub natsql: String,
}

/// Per-database schema descriptor from `tables.json`.
///
/// `column_names*` entries pair the owning table index with the column name;
/// index -1 marks the `*` pseudo-column. `foreign_keys` pairs column indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiderSchema {
    pub db_id: String,
    #[serde(default)]
    pub table_names: Vec<String>,
    #[serde(default)]
    pub table_names_original: Vec<String>,
    #[serde(default)]
    pub column_names: Vec<(i64, String)>,
    #[serde(default)]
    pub column_names_original: Vec<(i64, String)>,
    #[serde(default)]
    pub column_types: Vec<String>,
    #[serde(default)]
    pub primary_keys: Vec<i64>,
    #[serde(default)]
    pub foreign_keys: Vec<(usize, usize)>,
}

/// A bronze dataset row. Structured fields are carried as the JSON text they
/// were serialized to at ingestion.
#[derive(Debug, Clone)]
pub struct DatasetRecord {
    pub id: i64,
    pub db_id: String,
    pub source: Split,
    pub question: String,
    pub question_toks: String,
    pub query: String,
    pub query_toks: String,
    pub query_toks_no_value: String,
    pub sql_json: String,
}

/// A silver or gold row: the dataset record plus derived and review fields.
///
/// `simplified_ddl`, `full_ddl` and `foreign_keys` hold JSON arrays of
/// strings; `difficulty` is absent when the query could not be parsed.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub id: i64,
    pub db_id: String,
    pub source: Split,
    pub question: String,
    pub query: String,
    pub query_toks_no_value: String,
    pub sql_json: String,
    pub simplified_ddl: String,
    pub full_ddl: String,
    pub foreign_keys: String,
    pub difficulty: Option<Difficulty>,
    pub natsql: Option<String>,
    pub is_valid: bool,
    pub notes: Option<String>,
}
