//! Pipeline environment and filesystem layout.
//!
//! Every stage entry point takes a [`Layout`] explicitly; the two required
//! environment variables are read and validated once at process start.

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Root of the pipeline workspace (stores, templates, outputs).
pub const ROOT_ENV: &str = "SQUILL_ROOT";

/// Working directory holding the raw downloaded datasets.
pub const TMP_ENV: &str = "SQUILL_TMP";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// Filesystem layout for all pipeline inputs and outputs.
///
/// Stores live under `<root>/database/<tier>/`, rendered datasets under
/// `<root>/data/`, raw downloads under the working directory.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    tmp: PathBuf,
}

impl Layout {
    #[must_use]
    pub fn new(root: PathBuf, tmp: PathBuf) -> Self {
        Self { root, tmp }
    }

    /// Builds the layout from `SQUILL_ROOT` and `SQUILL_TMP`.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingEnv` if either variable is absent; this
    /// is a fatal startup error and no stage touches data before it passes.
    pub fn from_env() -> Result<Self, ConfigError> {
        let root = env::var(ROOT_ENV).map_err(|_| ConfigError::MissingEnv(ROOT_ENV))?;
        let tmp = env::var(TMP_ENV).map_err(|_| ConfigError::MissingEnv(TMP_ENV))?;
        Ok(Self::new(PathBuf::from(root), PathBuf::from(tmp)))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    // -- Stores --

    #[must_use]
    pub fn bronze_db(&self) -> PathBuf {
        self.root.join("database").join("bronze").join("bronze.sqlite")
    }

    #[must_use]
    pub fn bronze_schema_file(&self) -> PathBuf {
        self.root.join("database").join("bronze").join("schema.sql")
    }

    #[must_use]
    pub fn silver_db(&self) -> PathBuf {
        self.root.join("database").join("silver").join("silver.sqlite")
    }

    #[must_use]
    pub fn silver_schema_file(&self) -> PathBuf {
        self.root.join("database").join("silver").join("schema.sql")
    }

    #[must_use]
    pub fn gold_db(&self) -> PathBuf {
        self.root.join("database").join("gold").join("gold.sqlite")
    }

    #[must_use]
    pub fn gold_schema_file(&self) -> PathBuf {
        self.root.join("database").join("gold").join("schema.sql")
    }

    /// Directory of per-database SQLite files (`<dir>/<db_id>/<db_id>.sqlite`).
    #[must_use]
    pub fn spider_databases(&self) -> PathBuf {
        self.root.join("database").join("spider")
    }

    /// SQLite file backing one benchmark database.
    #[must_use]
    pub fn spider_db_file(&self, db_id: &str) -> PathBuf {
        self.spider_databases().join(db_id).join(format!("{db_id}.sqlite"))
    }

    // -- Raw inputs --

    /// Directory of the raw Spider release (dataset JSON + tables.json).
    #[must_use]
    pub fn raw_spider_dir(&self) -> PathBuf {
        self.tmp.join("spider_data")
    }

    /// Directory of the NatSQL annotation release.
    #[must_use]
    pub fn raw_natsql_dir(&self) -> PathBuf {
        self.tmp.join("NatSQL").join("NatSQLv1_6")
    }

    // -- Rendered datasets and run outputs --

    /// Prompt template file for a strategy.
    #[must_use]
    pub fn template_file(&self, strategy: &str, template_name: &str) -> PathBuf {
        self.root.join("data").join("templates").join(strategy).join(template_name)
    }

    /// Output directory for one rendered dataset (strategy x template).
    #[must_use]
    pub fn training_dir(&self, strategy: &str, template_stem: &str) -> PathBuf {
        self.root.join("data").join("training").join(strategy).join(template_stem)
    }

    /// Adapter output directory for one fine-tuning run.
    #[must_use]
    pub fn adapter_dir(&self, strategy: &str, template_stem: &str, model: &str) -> PathBuf {
        self.root
            .join("data")
            .join("adapters")
            .join(strategy)
            .join(template_stem)
            .join(model_short_name(model))
    }

    /// Prediction output directory for one inference run.
    #[must_use]
    pub fn predictions_dir(&self, strategy: &str, template_stem: &str, model: &str) -> PathBuf {
        self.root
            .join("data")
            .join("predictions")
            .join(strategy)
            .join(template_stem)
            .join(model_short_name(model))
    }

    /// Benchmark report directory.
    #[must_use]
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("data").join("benchmark")
    }

    /// Per-run prediction log directory.
    #[must_use]
    pub fn experiments_dir(&self) -> PathBuf {
        self.root.join("experiments")
    }
}

/// Strips the registry namespace from a model id for use in paths
/// (`mlx-community/phi-4-4bit` becomes `phi-4-4bit`).
#[must_use]
pub fn model_short_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = Layout::new(PathBuf::from("/pipeline"), PathBuf::from("/scratch"));
        assert_eq!(layout.bronze_db(), PathBuf::from("/pipeline/database/bronze/bronze.sqlite"));
        assert_eq!(
            layout.spider_db_file("farm"),
            PathBuf::from("/pipeline/database/spider/farm/farm.sqlite")
        );
        assert_eq!(layout.raw_spider_dir(), PathBuf::from("/scratch/spider_data"));
        assert!(layout.training_dir("nl2sql", "template_00").ends_with("nl2sql/template_00"));
    }

    #[test]
    fn test_model_short_name() {
        assert_eq!(model_short_name("mlx-community/phi-4-4bit"), "phi-4-4bit");
        assert_eq!(model_short_name("phi-4-4bit"), "phi-4-4bit");
    }
}
