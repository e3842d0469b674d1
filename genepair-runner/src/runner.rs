//! Run orchestration: wires together sampling, solving, storage,
//! classification and simulation.
//!
//! Two entry points:
//! - `run()`: one config, one dataset, plus the optional classify and simulate stages.
//! - `run_batch()`: the same for a list of configs, stopping at the first hard error.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use genepair_core::{ModelError, ModelVariant};

use crate::analysis::{classify_dataset, ClassificationManifest};
use crate::config::{ConfigError, RunConfig};
use crate::pipeline::{generate_dataset, SampleFailure};
use crate::simulation::run_simulation;
use crate::store::{DatasetStore, StoreError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("sample failed: {0}")]
    Sample(#[from] SampleFailure),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// What one run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub dataset: String,
    pub model: ModelVariant,
    pub requested: usize,
    pub written: usize,
    pub skipped: usize,
    pub raw_path: PathBuf,
    pub classification: Option<ClassificationManifest>,
    pub simulation_path: Option<PathBuf>,
}

/// Execute one run end to end.
pub fn run(config: &RunConfig) -> Result<RunSummary, RunError> {
    config.validate()?;
    let name = config.dataset_name();
    let store = DatasetStore::new(&config.output_dir);

    let generation = generate_dataset(config)?;
    let requested = generation.requested;
    let skipped = generation.failures.len();
    let dataset = generation.into_dataset();
    let raw_path = store.write_raw(&name, &dataset)?;
    tracing::info!(dataset = %name, rows = dataset.len(), path = %raw_path.display(), "raw dataset written");

    let classification = match &config.classify {
        Some(section) => Some(classify_dataset(&store, &name, section)?.manifest),
        None => None,
    };

    let simulation_path = match &config.simulate {
        Some(section) => Some(run_simulation(&store, &name, config.model, section, config.seed)?.path),
        None => None,
    };

    Ok(RunSummary {
        dataset: name,
        model: config.model,
        requested,
        written: dataset.len(),
        skipped,
        raw_path,
        classification,
        simulation_path,
    })
}

/// Execute several runs in order.
pub fn run_batch(configs: &[RunConfig]) -> Result<Vec<RunSummary>, RunError> {
    let total = configs.len();
    configs
        .iter()
        .enumerate()
        .map(|(i, config)| {
            tracing::info!(run = i + 1, total, dataset = %config.dataset_name(), "starting run");
            run(config)
        })
        .collect()
}
