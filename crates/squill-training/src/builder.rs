//! Dataset builder: gold records to prompt/completion splits.
//!
//! For each gold row the prompt is rendered from the template and the
//! completion is the target query verbatim. Splits are written as JSONL
//! next to flat `query<TAB>db_id` files for the benchmark tool; the `dev`
//! split is renamed `valid` in file names.

use crate::cells::sample_cell_values;
use crate::dataset::{PromptExample, write_jsonl_examples};
use crate::error::{TrainingError, TrainingResult};
use crate::template::{FEW_SHOT, TemplateVars, render};
use squill_core::records::{EnrichedRecord, Split};
use squill_core::storage::{EnrichedRepository, Store};
use squill_core::Layout;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Which target language the completion carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Completion is the SQL query.
    Nl2Sql,
    /// Completion is the NatSQL rendition.
    Nl2NatSql,
}

impl Strategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Nl2Sql => "nl2sql",
            Strategy::Nl2NatSql => "nl2natsql",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nl2sql" => Ok(Strategy::Nl2Sql),
            "nl2natsql" => Ok(Strategy::Nl2NatSql),
            other => Err(TrainingError::InvalidSpec(format!("unknown strategy: {other}"))),
        }
    }
}

/// Options for one builder run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub strategy: Strategy,
    /// Template file name under the strategy's template directory.
    pub template_name: String,
    /// Example values sampled per column.
    pub max_cell_samples: usize,
}

impl BuildOptions {
    #[must_use]
    pub fn new(strategy: Strategy, template_name: String) -> Self {
        Self { strategy, template_name, max_cell_samples: 3 }
    }

    /// Directory stem derived from the template file name.
    #[must_use]
    pub fn template_stem(&self) -> &str {
        Path::new(&self.template_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.template_name)
    }
}

/// Per-split example counts after a builder run.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildSummary {
    pub train: usize,
    pub valid: usize,
    pub test: usize,
    /// Records skipped because the strategy's completion was absent.
    pub skipped: usize,
}

/// Joins a stored JSON array of strings into one-per-line text.
fn json_lines(field: &str) -> TrainingResult<String> {
    if field.is_empty() {
        return Ok(String::new());
    }
    let items: Vec<String> = serde_json::from_str(field)?;
    Ok(items.join("\n"))
}

fn completion_for(record: &EnrichedRecord, strategy: Strategy) -> Option<String> {
    match strategy {
        Strategy::Nl2Sql => Some(record.query.clone()),
        Strategy::Nl2NatSql => record.natsql.clone(),
    }
}

/// Renders the examples for one split.
fn render_split(
    records: &[EnrichedRecord],
    template: &str,
    layout: &Layout,
    options: &BuildOptions,
    skipped: &mut usize,
) -> TrainingResult<Vec<PromptExample>> {
    let mut examples = Vec::with_capacity(records.len());

    for record in records {
        let Some(completion) = completion_for(record, options.strategy) else {
            warn!(id = record.id, source = %record.source, db_id = %record.db_id,
                  "skipping record without a NatSQL rendition");
            *skipped += 1;
            continue;
        };

        let db_file = layout.spider_db_file(&record.db_id);
        let data_samples = match sample_cell_values(&db_file, options.max_cell_samples) {
            Ok(samples) => samples,
            Err(e) => {
                warn!(db_id = %record.db_id, error = %e,
                      "cell sampling unavailable, continuing without samples");
                String::new()
            }
        };

        let vars = TemplateVars {
            question: record.question.clone(),
            schema_ddl: json_lines(&record.simplified_ddl)?,
            full_ddl: json_lines(&record.full_ddl)?,
            foreign_keys: json_lines(&record.foreign_keys)?,
            data_samples,
            few_shot: FEW_SHOT.to_string(),
        };

        examples.push(PromptExample { prompt: render(template, &vars), completion });
    }

    Ok(examples)
}

/// Writes the flat `query<TAB>db_id` companion file for one split.
fn write_query_file(path: &Path, records: &[EnrichedRecord]) -> TrainingResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = String::new();
    for record in records {
        out.push_str(&record.query);
        out.push('\t');
        out.push_str(&record.db_id);
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}

/// Runs the dataset builder over the gold store.
///
/// A missing template file is a fatal error raised before any records are
/// read.
pub fn build_dataset(
    gold: &Store,
    layout: &Layout,
    options: &BuildOptions,
) -> TrainingResult<BuildSummary> {
    let template_path = layout.template_file(options.strategy.as_str(), &options.template_name);
    let template = std::fs::read_to_string(&template_path).map_err(|e| {
        TrainingError::Template(format!(
            "cannot read template {}: {}",
            template_path.display(),
            e
        ))
    })?;

    let out_dir = layout.training_dir(options.strategy.as_str(), options.template_stem());
    let repo = EnrichedRepository::gold(gold.conn());
    let mut summary = BuildSummary::default();

    for split in Split::ALL {
        let records = repo.fetch_by_split(split)?;
        let examples = render_split(&records, &template, layout, options, &mut summary.skipped)?;

        let stem = split.file_stem();
        write_jsonl_examples(&out_dir.join(format!("{stem}.jsonl")), &examples)?;
        write_query_file(&out_dir.join(format!("{stem}.sql")), &records)?;

        info!(split = %split, examples = examples.len(), "rendered split");
        match split {
            Split::Train => summary.train = examples.len(),
            Split::Dev => summary.valid = examples.len(),
            Split::Test => summary.test = examples.len(),
        }
    }

    Ok(summary)
}
