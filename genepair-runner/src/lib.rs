//! genepair runner: run orchestration on top of `genepair-core`.
//!
//! This crate provides:
//! - TOML run configs with per-row error policy
//! - Serial or rayon-parallel dataset generation with stable row order
//! - A file-based dataset store (raw, analysed and simulation namespaces)
//! - Classification of stored datasets into per-category files with a manifest
//! - Chain simulation runs
//! - Sweep-all batches over every parameter and parameter pair

pub mod analysis;
pub mod batch;
pub mod config;
pub mod pipeline;
pub mod runner;
pub mod simulation;
pub mod store;

pub use analysis::{classify_dataset, Analysis, CategoryEntry, ClassificationManifest, ExcludedRow};
pub use batch::{batch_configs, sweep_plans, SweepShape};
pub use config::{ClassifySection, ConfigError, ErrorPolicy, RunConfig, SimulateSection, SolverSection};
pub use pipeline::{evaluate_all, generate_dataset, Generation, SampleFailure};
pub use runner::{run, run_batch, RunError, RunSummary};
pub use simulation::{run_simulation, simulation_params, SimulationRun};
pub use store::{Dataset, DatasetStore, StoreError, WriteOutcome};
