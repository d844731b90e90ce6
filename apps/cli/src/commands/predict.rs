//! Batch inference command implementation.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use squill_core::Layout;
use squill_models::{
    BatchSummary, ChatCompletionsModel, MlxModel, MockModel, Model, ModelParameters, OllamaModel,
    Provider, load_prompts, run_batch, write_predictions,
};
use squill_training::Strategy;
use std::path::{Path, PathBuf};

/// Default base model for the local mlx backend.
const DEFAULT_MLX_MODEL: &str = "mlx-community/Llama-3.2-3B-Instruct-4bit";

pub struct PredictArgs {
    pub model: Option<String>,
    pub backend: String,
    pub strategy: String,
    pub template: String,
    pub input_file: String,
    pub output_file: Option<PathBuf>,
    pub use_adapter: bool,
    pub max_tokens: u32,
}

pub async fn execute(args: PredictArgs) -> Result<()> {
    let layout = super::layout()?;
    let strategy: Strategy = args.strategy.parse()?;
    let stem = super::template_stem(&args.template);

    let input_path = resolve_input(&layout, strategy, stem, &args.input_file);
    let prompts = load_prompts(&input_path)
        .with_context(|| format!("failed to load prompts from {}", input_path.display()))?;
    if prompts.is_empty() {
        bail!("no prompts found in {}", input_path.display());
    }

    let (model, model_name) = build_model(&layout, strategy, stem, &args)?;
    println!(
        "Starting batch inference with {} prompts on {} ({})",
        prompts.len().to_string().cyan(),
        model_name.cyan(),
        args.backend
    );

    let parameters =
        ModelParameters { max_tokens: Some(args.max_tokens), ..ModelParameters::default() };
    let results = run_batch(model.as_ref(), &prompts, &parameters).await;

    let output_path = args.output_file.clone().unwrap_or_else(|| {
        default_output(&layout, strategy, stem, &model_name, &args.input_file, args.use_adapter)
    });
    write_predictions(&output_path, &results)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    let summary = BatchSummary::from_results(&results);
    write_run_log(&layout, &args, &model_name, &summary, &output_path)?;

    println!();
    println!("{}", "Batch inference complete".bold().green());
    println!("  Total prompts: {}", summary.total.to_string().cyan());
    println!("  Successful:    {}", summary.succeeded.to_string().green());
    println!("  Failed:        {}", summary.failed.to_string().yellow());
    println!("  Total time:    {:.2}s", summary.total_time.as_secs_f64());
    println!("  Results saved to {}", output_path.display().to_string().dimmed());
    Ok(())
}

/// Accepts either an explicit path or a split name under the rendered
/// dataset directory (with or without the .jsonl suffix).
fn resolve_input(layout: &Layout, strategy: Strategy, stem: &str, input: &str) -> PathBuf {
    let as_path = Path::new(input);
    if as_path.exists() {
        return as_path.to_path_buf();
    }
    let name = input.strip_suffix(".jsonl").unwrap_or(input);
    layout.training_dir(strategy.as_str(), stem).join(format!("{name}.jsonl"))
}

fn default_output(
    layout: &Layout,
    strategy: Strategy,
    stem: &str,
    model_name: &str,
    input: &str,
    use_adapter: bool,
) -> PathBuf {
    let input_stem = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(input);
    let suffix = if use_adapter { "_finetuned" } else { "" };
    layout
        .predictions_dir(strategy.as_str(), stem, model_name)
        .join(format!("{input_stem}_predictions{suffix}.sql"))
}

fn build_model(
    layout: &Layout,
    strategy: Strategy,
    stem: &str,
    args: &PredictArgs,
) -> Result<(Box<dyn Model>, String)> {
    let model: Box<dyn Model> = match args.backend.as_str() {
        "mock" => Box::new(MockModel::new(
            args.model.clone().unwrap_or_else(|| "mock".to_string()),
        )),
        "mlx" => {
            let model_id =
                args.model.clone().unwrap_or_else(|| DEFAULT_MLX_MODEL.to_string());
            let adapter = args
                .use_adapter
                .then(|| layout.adapter_dir(strategy.as_str(), stem, &model_id));
            Box::new(MlxModel::new(model_id, adapter))
        }
        "ollama" => Box::new(OllamaModel::new(args.model.clone())),
        backend => {
            let provider: Provider = backend.parse()?;
            Box::new(ChatCompletionsModel::for_provider(provider, args.model.clone())?)
        }
    };
    let name = model.model_id().to_string();
    Ok((model, name))
}

#[derive(Serialize)]
struct RunLog<'a> {
    model: &'a str,
    backend: &'a str,
    strategy: &'a str,
    template: &'a str,
    max_tokens: u32,
    use_adapter: bool,
    total: usize,
    succeeded: usize,
    failed: usize,
    total_secs: f64,
    output_file: String,
    timestamp: String,
}

/// Records one inference run as a timestamped JSON document under the
/// experiments directory.
fn write_run_log(
    layout: &Layout,
    args: &PredictArgs,
    model_name: &str,
    summary: &BatchSummary,
    output_path: &Path,
) -> Result<()> {
    let dir = layout.experiments_dir();
    std::fs::create_dir_all(&dir)?;

    let now = Utc::now();
    let log = RunLog {
        model: model_name,
        backend: &args.backend,
        strategy: &args.strategy,
        template: &args.template,
        max_tokens: args.max_tokens,
        use_adapter: args.use_adapter,
        total: summary.total,
        succeeded: summary.succeeded,
        failed: summary.failed,
        total_secs: summary.total_time.as_secs_f64(),
        output_file: output_path.display().to_string(),
        timestamp: now.to_rfc3339(),
    };

    let file = dir.join(format!("run_{}.json", now.format("%Y%m%d_%H%M%S")));
    std::fs::write(&file, serde_json::to_string_pretty(&log)?)?;
    println!("  Run logged to {}", file.display().to_string().dimmed());
    Ok(())
}
