//! Squill Training
//!
//! Dataset building and fine-tuning primitives:
//! - Prompt/completion examples and JSONL serialization (`dataset`)
//! - Template rendering over gold records (`template`, `builder`)
//! - Live cell-value sampling from per-database stores (`cells`)
//! - LoRA job specs and the `Trainer` seam with the `mlx_lm` backend
//!   (`job`, `trainer`, `mlx`)

pub mod builder;
pub mod cells;
pub mod dataset;
pub mod error;
pub mod job;
pub mod mlx;
pub mod template;
pub mod trainer;

pub use builder::{BuildOptions, BuildSummary, Strategy, build_dataset};
pub use cells::sample_cell_values;
pub use dataset::{PromptExample, read_jsonl_examples, write_jsonl_examples};
pub use error::{TrainingError, TrainingResult};
pub use job::{LoraHyperParams, LoraJobSpec};
pub use mlx::MlxLoraTrainer;
pub use template::{TemplateVars, render};
pub use trainer::{AdapterArtifact, Trainer};
