//! Dataset generation: sample → build → solve, serial or on the rayon pool.
//!
//! Row order in the output always follows the sampling plan's order, so a
//! parallel run writes the same file as a serial one.

use rayon::prelude::*;
use thiserror::Error;

use genepair_core::{
    evaluate, ModelError, ModelVariant, ParameterVector, RngHierarchy, SampleRecord, SolverConfig,
};

use crate::config::{ErrorPolicy, RunConfig};
use crate::store::Dataset;

/// One row that could not be solved.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {index} ({params}): {source}")]
pub struct SampleFailure {
    pub index: usize,
    pub params: ParameterVector,
    #[source]
    pub source: ModelError,
}

/// Output of one generation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub variant: ModelVariant,
    pub records: Vec<SampleRecord>,
    pub failures: Vec<SampleFailure>,
    pub requested: usize,
}

impl Generation {
    pub fn into_dataset(self) -> Dataset {
        Dataset::new(self.variant, self.records)
    }
}

/// Solve every parameter vector, keeping input order.
///
/// Under [`ErrorPolicy::Abort`] the first failing row (by index) is returned
/// as the error. Under [`ErrorPolicy::Skip`] failing rows are logged and
/// collected in [`Generation::failures`].
pub fn evaluate_all(
    rows: &[ParameterVector],
    variant: ModelVariant,
    solver: &SolverConfig,
    policy: ErrorPolicy,
    parallel: bool,
) -> Result<Generation, SampleFailure> {
    let solve_row = |(index, params): (usize, &ParameterVector)| {
        evaluate(params, variant, solver).map_err(|source| SampleFailure {
            index,
            params: *params,
            source,
        })
    };

    let outcomes: Vec<Result<SampleRecord, SampleFailure>> = if parallel {
        rows.par_iter().enumerate().map(solve_row).collect()
    } else {
        rows.iter().enumerate().map(solve_row).collect()
    };

    let mut records = Vec::with_capacity(rows.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(record) => records.push(record),
            Err(failure) => match policy {
                ErrorPolicy::Abort => return Err(failure),
                ErrorPolicy::Skip => {
                    tracing::warn!(
                        row = failure.index,
                        params = %failure.params,
                        error = %failure.source,
                        "skipping row"
                    );
                    failures.push(failure);
                }
            },
        }
    }

    Ok(Generation {
        variant,
        records,
        failures,
        requested: rows.len(),
    })
}

/// Generate the parameter rows of `config` and solve them.
pub fn generate_dataset(config: &RunConfig) -> Result<Generation, crate::runner::RunError> {
    let name = config.dataset_name();
    let rngs = RngHierarchy::new(config.seed);
    let rows = config.sampling.generate(config.model, &rngs, &name)?;
    tracing::info!(
        dataset = %name,
        model = %config.model,
        rows = rows.len(),
        parallel = config.parallel,
        "generating dataset"
    );
    let generation = evaluate_all(
        &rows,
        config.model,
        &config.solver.solver_config(),
        config.on_error,
        config.parallel,
    )?;
    tracing::info!(
        dataset = %name,
        solved = generation.records.len(),
        failed = generation.failures.len(),
        "dataset generated"
    );
    Ok(generation)
}
