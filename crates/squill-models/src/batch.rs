//! Sequential batch inference.
//!
//! One completion per prompt, in prompt order. Generation failures are
//! captured per prompt; the output file always has exactly one line per
//! input prompt, with failures rendered as empty lines so later entries
//! never shift position.

use crate::{Model, ModelError, ModelParameters};
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of one prompt in a batch run.
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// Position of the prompt in the input file.
    pub index: usize,
    /// Normalized single-line response; `None` when generation failed.
    pub response: Option<String>,
    /// Wall-clock generation time.
    pub latency: Duration,
    pub status: PredictionStatus,
    /// Error text for failed generations.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStatus {
    Success,
    Error,
}

/// End-of-run totals.
#[derive(Debug, Clone, Copy)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_time: Duration,
}

impl BatchSummary {
    #[must_use]
    pub fn from_results(results: &[PredictionResult]) -> Self {
        let succeeded =
            results.iter().filter(|r| r.status == PredictionStatus::Success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            total_time: results.iter().map(|r| r.latency).sum(),
        }
    }
}

#[derive(Deserialize)]
struct PromptLine {
    prompt: Option<String>,
}

/// Loads prompts from a JSONL file where each line carries a `prompt` field.
///
/// Blank lines, malformed JSON, and objects without the field are skipped
/// with a warning; they never abort the load.
pub fn load_prompts(path: &Path) -> Result<Vec<String>, ModelError> {
    let contents = std::fs::read_to_string(path)?;
    let mut prompts = Vec::new();

    for (line_num, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<PromptLine>(line) {
            Ok(PromptLine { prompt: Some(prompt) }) => prompts.push(prompt),
            Ok(PromptLine { prompt: None }) => {
                warn!(line = line_num + 1, "line missing 'prompt' field, skipping");
            }
            Err(e) => {
                warn!(line = line_num + 1, error = %e, "invalid JSON line, skipping");
            }
        }
    }

    Ok(prompts)
}

/// Normalizes a response to fit in a single line: all whitespace runs
/// (including newlines and tabs) collapse to single spaces.
#[must_use]
pub fn normalize_response(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Generates one completion per prompt, sequentially and in order.
pub async fn run_batch(
    model: &dyn Model,
    prompts: &[String],
    parameters: &ModelParameters,
) -> Vec<PredictionResult> {
    let mut results = Vec::with_capacity(prompts.len());

    for (index, prompt) in prompts.iter().enumerate() {
        info!(index = index + 1, total = prompts.len(), "processing prompt");
        let start = Instant::now();

        let result = match model.generate_text(prompt, Some(parameters.clone())).await {
            Ok(response) => PredictionResult {
                index,
                response: Some(normalize_response(&response.content)),
                latency: start.elapsed(),
                status: PredictionStatus::Success,
                error: None,
            },
            Err(e) => {
                warn!(index = index + 1, error = %e, "generation failed for prompt");
                PredictionResult {
                    index,
                    response: None,
                    latency: start.elapsed(),
                    status: PredictionStatus::Error,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }

    results
}

/// Writes one line per result, in original prompt order. Failed entries
/// produce an empty line.
pub fn write_predictions(path: &Path, results: &[PredictionResult]) -> Result<(), ModelError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = String::new();
    for result in results {
        if let Some(response) = &result.response {
            out.push_str(response);
        }
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}
