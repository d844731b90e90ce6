use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One training example: a rendered prompt paired with its target query.
///
/// The completion is the curated record's query verbatim; no normalization
/// is applied at this stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptExample {
    pub prompt: String,
    pub completion: String,
}

/// Writes examples as one JSON object per line.
pub fn write_jsonl_examples(path: &Path, examples: &[PromptExample]) -> TrainingResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = String::new();
    for example in examples {
        out.push_str(&serde_json::to_string(example)?);
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}

/// Reads a JSONL example file back. A malformed line is an error here, not
/// a skip: these files are produced by this pipeline, never hand-written.
pub fn read_jsonl_examples(path: &Path) -> TrainingResult<Vec<PromptExample>> {
    let contents = std::fs::read_to_string(path)?;
    let mut examples = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let example: PromptExample = serde_json::from_str(line).map_err(|e| {
            TrainingError::Dataset(format!("failed to parse jsonl line {}: {}", idx + 1, e))
        })?;
        examples.push(example);
    }
    Ok(examples)
}
