//! Squill CLI - drive the NL-to-SQL fine-tuning pipeline
//!
//! One subcommand per pipeline stage, invoked manually and in order:
//! ingest -> refine -> curate -> dataset -> {finetune, predict} -> benchmark.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Squill - NL-to-SQL fine-tuning data pipeline
///
/// Converts the Spider benchmark into bronze/silver/gold data tiers, builds
/// prompt/completion training sets, drives LoRA fine-tuning and batch
/// inference, and benchmarks predictions against gold queries.
#[derive(Parser, Debug)]
#[command(
    name = "squill",
    author,
    version,
    about = "Squill - NL-to-SQL fine-tuning data pipeline"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the raw dataset files into the bronze store
    ///
    /// Reads the Spider splits, the NatSQL annotations, and both schema
    /// descriptor files. Any malformed input aborts the run.
    Ingest {
        /// Raw Spider directory (defaults to <SQUILL_TMP>/spider_data)
        #[arg(long)]
        spider_dir: Option<PathBuf>,

        /// NatSQL annotation directory (defaults to
        /// <SQUILL_TMP>/NatSQL/NatSQLv1_6)
        #[arg(long)]
        natsql_dir: Option<PathBuf>,
    },

    /// Clean and annotate bronze rows into the silver store
    ///
    /// Lowercases questions, normalizes queries, classifies difficulty, and
    /// derives schema context. Individual bad rows are skipped and reported.
    Refine,

    /// Copy reviewed silver rows into the gold store
    ///
    /// Carries the hand-edited is_valid/notes fields verbatim; edit them in
    /// the silver store before running this stage.
    Curate,

    /// Render prompt/completion splits from the gold store
    Dataset {
        /// Target language for completions
        #[arg(long, value_parser = ["nl2sql", "nl2natsql"])]
        strategy: String,

        /// Template file name (e.g. template_00.txt)
        #[arg(long)]
        template: String,
    },

    /// Fine-tune a LoRA adapter on a rendered dataset
    Finetune {
        /// Base model identifier
        #[arg(long)]
        model: String,

        /// Strategy the dataset was rendered with
        #[arg(long, value_parser = ["nl2sql", "nl2natsql"])]
        strategy: String,

        /// Template the dataset was rendered with
        #[arg(long)]
        template: String,

        /// Training iterations
        #[arg(long, default_value_t = 50)]
        iters: u32,

        /// Batch size
        #[arg(long, default_value_t = 2)]
        batch_size: u32,

        /// Number of tunable layers
        #[arg(long, default_value_t = 16)]
        num_layers: u32,

        /// Maximum sequence length
        #[arg(long, default_value_t = 2048)]
        max_seq_len: u32,

        /// Interpreter used to launch the external trainer
        #[arg(long, default_value = "python3")]
        trainer_program: String,
    },

    /// Generate predicted queries for a prompt file
    Predict {
        /// Model identifier (defaults to the backend's default model)
        #[arg(long)]
        model: Option<String>,

        /// Generation backend
        #[arg(long, default_value = "mlx",
              value_parser = ["mlx", "mock", "openai", "lmstudio", "ollama", "exo"])]
        backend: String,

        /// Strategy the prompts were rendered with
        #[arg(long, value_parser = ["nl2sql", "nl2natsql"])]
        strategy: String,

        /// Template the prompts were rendered with
        #[arg(long)]
        template: String,

        /// Prompt file: a path, or a split name under the rendered dataset
        /// directory (e.g. valid)
        #[arg(long)]
        input_file: String,

        /// Output file (defaults under the predictions directory)
        #[arg(long)]
        output_file: Option<PathBuf>,

        /// Load the fine-tuned adapter next to the base model (mlx backend)
        #[arg(long, default_value_t = false)]
        use_adapter: bool,

        /// Maximum tokens per completion
        #[arg(long, default_value_t = 512)]
        max_tokens: u32,
    },

    /// Benchmark predicted queries against gold queries
    ///
    /// Rebuilds the evaluator's tables document from the bronze schema rows
    /// and captures the external evaluation report to a file.
    Benchmark {
        /// Gold query file (query<TAB>db_id per line)
        #[arg(long)]
        gold_file: PathBuf,

        /// Predicted query file (one query per line)
        #[arg(long)]
        predict_file: PathBuf,

        /// Report output file (defaults to
        /// <SQUILL_ROOT>/data/benchmark/eval_results.txt)
        #[arg(long)]
        output_file: Option<PathBuf>,

        /// Command used to launch the external evaluation tool
        #[arg(long, default_value = "python3 -m spider.evaluation")]
        evaluator_cmd: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Ingest { spider_dir, natsql_dir } => {
            commands::ingest::execute(spider_dir, natsql_dir).await?;
        }
        Command::Refine => {
            commands::refine::execute().await?;
        }
        Command::Curate => {
            commands::curate::execute().await?;
        }
        Command::Dataset { strategy, template } => {
            commands::dataset::execute(strategy, template).await?;
        }
        Command::Finetune {
            model,
            strategy,
            template,
            iters,
            batch_size,
            num_layers,
            max_seq_len,
            trainer_program,
        } => {
            commands::finetune::execute(commands::finetune::FinetuneArgs {
                model,
                strategy,
                template,
                iters,
                batch_size,
                num_layers,
                max_seq_len,
                trainer_program,
            })
            .await?;
        }
        Command::Predict {
            model,
            backend,
            strategy,
            template,
            input_file,
            output_file,
            use_adapter,
            max_tokens,
        } => {
            commands::predict::execute(commands::predict::PredictArgs {
                model,
                backend,
                strategy,
                template,
                input_file,
                output_file,
                use_adapter,
                max_tokens,
            })
            .await?;
        }
        Command::Benchmark { gold_file, predict_file, output_file, evaluator_cmd } => {
            commands::benchmark::execute(gold_file, predict_file, output_file, evaluator_cmd)
                .await?;
        }
    }

    Ok(())
}
