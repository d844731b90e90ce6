//! Fine-tuning command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use squill_training::{LoraHyperParams, LoraJobSpec, MlxLoraTrainer, Strategy, Trainer};

pub struct FinetuneArgs {
    pub model: String,
    pub strategy: String,
    pub template: String,
    pub iters: u32,
    pub batch_size: u32,
    pub num_layers: u32,
    pub max_seq_len: u32,
    pub trainer_program: String,
}

pub async fn execute(args: FinetuneArgs) -> Result<()> {
    let layout = super::layout()?;
    let strategy: Strategy = args.strategy.parse()?;
    let stem = super::template_stem(&args.template);

    let data_dir = layout.training_dir(strategy.as_str(), stem);
    let adapter_dir = layout.adapter_dir(strategy.as_str(), stem, &args.model);

    let mut job = LoraJobSpec::new(args.model, data_dir, adapter_dir);
    job.hyperparams = LoraHyperParams {
        iters: args.iters,
        batch_size: args.batch_size,
        num_layers: args.num_layers,
        max_seq_len: args.max_seq_len,
    };
    job.validate().context("invalid fine-tuning job")?;

    println!("Fine-tuning {} on {}", job.base_model.cyan(), job.data_dir.display());
    let trainer = MlxLoraTrainer::with_program(args.trainer_program);
    let artifact = trainer.run(&job).await.context("fine-tuning failed")?;

    println!();
    println!("{}", "Fine-tuning complete".bold().green());
    println!("  Adapter: {}", artifact.adapter_dir.display().to_string().cyan());
    Ok(())
}
