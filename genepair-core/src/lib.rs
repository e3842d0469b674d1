//! genepair core: two-gene Markov chain model, steady-state solver, sampler,
//! chain simulator and regime classifier.
//!
//! This crate is pure computation:
//! - Domain types (parameter vectors, joint states, steady states, dataset rows)
//! - Transition matrix builder for the competitive (6-parameter) and
//!   symmetric (5-parameter) forms
//! - Steady-state solver with strict unit-eigenvector validation
//! - Random and sweep parameter sampling with a deterministic RNG hierarchy
//! - Random-walk simulator over the joint state space
//! - First-match-wins regime classification

pub mod classify;
pub mod domain;
pub mod error;
pub mod matrix;
pub mod rng;
pub mod sampler;
pub mod simulate;
pub mod steady_state;

pub use classify::{classify, normalize, Category, Classification, Excluded, Normalization};
pub use domain::{JointState, ModelVariant, ParamName, ParameterVector, SampleRecord, SteadyState};
pub use error::ModelError;
pub use matrix::TransitionMatrix;
pub use rng::RngHierarchy;
pub use sampler::{Distribution, Fixed, SamplingPlan};
pub use simulate::{simulate, TimeSeries};
pub use steady_state::{solve, steady_state, SolverConfig};

/// Build the transition matrix for `params` and solve it into a dataset row.
pub fn evaluate(
    params: &ParameterVector,
    variant: ModelVariant,
    solver: &SolverConfig,
) -> Result<SampleRecord, ModelError> {
    let tm = TransitionMatrix::build(params, variant)?;
    let ss = solve(&tm, solver)?;
    Ok(SampleRecord::new(*params, ss))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: every type the runner moves across rayon threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<ParameterVector>();
        require_sync::<ParameterVector>();
        require_send::<SampleRecord>();
        require_sync::<SampleRecord>();
        require_send::<TransitionMatrix>();
        require_sync::<TransitionMatrix>();
        require_send::<ModelError>();
        require_sync::<ModelError>();
        require_send::<SamplingPlan>();
        require_sync::<SamplingPlan>();
        require_send::<RngHierarchy>();
        require_sync::<RngHierarchy>();
        require_send::<Classification>();
        require_sync::<Classification>();
    }

    #[test]
    fn evaluate_keeps_the_input_parameters() {
        let params = ParameterVector::competitive(0.3, 0.3, 0.5, 0.5, 4.0, 0.2);
        let record = evaluate(&params, ModelVariant::Competitive, &SolverConfig::default()).unwrap();
        assert_eq!(record.params, params);
        assert!((record.steady_state.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn evaluate_surfaces_degenerate_matrices() {
        let params = ParameterVector::competitive(0.0, 0.3, 0.5, 0.5, 4.0, 0.2);
        assert!(matches!(
            evaluate(&params, ModelVariant::Competitive, &SolverConfig::default()),
            Err(ModelError::DegenerateMatrix { .. })
        ));
    }
}
