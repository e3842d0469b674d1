//! Chain simulation runs written to `raw/<name>-sim.csv`.

use std::path::PathBuf;

use genepair_core::sampler::random_sample;
use genepair_core::{simulate, ModelVariant, ParameterVector, RngHierarchy, TimeSeries, TransitionMatrix};

use crate::config::SimulateSection;
use crate::runner::RunError;
use crate::store::DatasetStore;

/// Sub-stream index used for the simulator, after the one used for a random parameter draw.
const WALK_STREAM: u64 = 1;

#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub params: ParameterVector,
    pub series: TimeSeries,
    pub path: PathBuf,
}

/// Parameters for a simulation: explicit ones, or one random draw from `rng_for(name, 0)`.
pub fn simulation_params(
    section: &SimulateSection,
    variant: ModelVariant,
    rngs: &RngHierarchy,
    name: &str,
) -> Result<ParameterVector, RunError> {
    match section.params {
        Some(params) => {
            params.validate(variant)?;
            Ok(params)
        }
        None => {
            let mut rng = rngs.rng_for(name, 0);
            Ok(random_sample(&mut rng, variant, section.distribution))
        }
    }
}

/// Simulate one chain and store its time series under `name`.
pub fn run_simulation(
    store: &DatasetStore,
    name: &str,
    variant: ModelVariant,
    section: &SimulateSection,
    seed: u64,
) -> Result<SimulationRun, RunError> {
    let rngs = RngHierarchy::new(seed);
    let params = simulation_params(section, variant, &rngs, name)?;
    let tm = TransitionMatrix::build(&params, variant)?;
    let mut rng = rngs.rng_for(name, WALK_STREAM);
    let series = simulate(&tm, section.t_max, &mut rng)?;
    let path = store.write_simulation(name, &series)?;
    tracing::info!(
        dataset = %name,
        params = %params,
        steps = section.t_max,
        path = %path.display(),
        "simulation written"
    );
    Ok(SimulationRun {
        params,
        series,
        path,
    })
}
