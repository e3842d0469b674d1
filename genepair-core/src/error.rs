//! Error taxonomy for the model core.
//!
//! Every failure is unrecoverable at the level of a single sample. Callers
//! (the batch runner) decide whether to abort or skip and continue.

use thiserror::Error;

/// Errors produced by the matrix builder, solver, sampler, simulator and classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown distribution '{0}' (expected one of: uni, uniform, loguni, log-uniform)")]
    UnknownDistribution(String),

    #[error("degenerate transition matrix: column {column} sums to {sum}")]
    DegenerateMatrix { column: usize, sum: f64 },

    #[error("steady-state eigenvector not found: {candidates} candidate(s) passed (expected exactly 1)")]
    EigenvectorNotFound { candidates: usize },

    #[error("eigenvalue {re} + {im}i lies within tolerance of 1 but is not real")]
    ComplexEigenvalue { re: f64, im: f64 },

    #[error("cannot normalize row: divisor '{divisor}' is zero")]
    ZeroDivisor { divisor: String },

    #[error("simulation failed at t={step}: {reason}")]
    SimulationFailed { step: usize, reason: String },
}
