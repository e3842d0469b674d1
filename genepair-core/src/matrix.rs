//! Transition matrix builder.
//!
//! Rows and columns are indexed by [`JointState`] in the order `00, 01, 10, 11`.
//! Entry `(i, j)` is the probability of moving from state `j` to state `i`, so
//! every column is a probability distribution (column-stochastic).

use nalgebra::Matrix4;

use crate::domain::{JointState, ModelVariant, ParameterVector};
use crate::error::ModelError;

/// A validated 4×4 column-stochastic matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionMatrix {
    inner: Matrix4<f64>,
}

impl TransitionMatrix {
    /// Assemble and normalize the matrix for `params` under `variant`.
    pub fn build(params: &ParameterVector, variant: ModelVariant) -> Result<Self, ModelError> {
        params.validate(variant)?;
        let weights = match (variant, params.delta) {
            (ModelVariant::Competitive, Some(delta)) => competitive_weights(params, delta),
            (ModelVariant::Symmetric, _) => symmetric_weights(params),
            (ModelVariant::Competitive, None) => {
                return Err(ModelError::InvalidParameter(
                    "competitive model requires δ".into(),
                ))
            }
        };
        Self::from_weights(weights)
    }

    /// Normalize each column of a non-negative weight matrix to sum to 1.
    pub fn from_weights(weights: Matrix4<f64>) -> Result<Self, ModelError> {
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "transition weights must be finite and non-negative, got {bad}"
            )));
        }

        let mut inner = weights;
        for (column, mut col) in inner.column_iter_mut().enumerate() {
            let sum = col.sum();
            if !sum.is_finite() || sum <= 0.0 {
                return Err(ModelError::DegenerateMatrix { column, sum });
            }
            col /= sum;
        }
        Ok(Self { inner })
    }

    /// Probability of moving `from` → `to` in one step.
    pub fn probability(&self, from: JointState, to: JointState) -> f64 {
        self.inner[(to.index(), from.index())]
    }

    /// Next-state distribution when currently in `from`.
    pub fn column(&self, from: JointState) -> [f64; 4] {
        let c = self.inner.column(from.index());
        [c[0], c[1], c[2], c[3]]
    }

    pub fn as_matrix(&self) -> &Matrix4<f64> {
        &self.inner
    }

    /// Advance a distribution over states by one step.
    pub fn propagate(&self, distribution: [f64; 4]) -> [f64; 4] {
        let v = self.inner * nalgebra::Vector4::from(distribution);
        [v[0], v[1], v[2], v[3]]
    }
}

/// Six-parameter form. Zeros block 00↔11 and the 01↔10 cross moves.
fn competitive_weights(params: &ParameterVector, delta: f64) -> Matrix4<f64> {
    let ParameterVector {
        p, q, r, s, lambda, ..
    } = *params;
    #[rustfmt::skip]
    let m = Matrix4::new(
        p * p,     p * r,          p * r,          0.0,
        p * s,     p * q,          0.0,            delta * q * r,
        p * s,     0.0,            p * q,          delta * q * r,
        0.0,       lambda * q * s, lambda * q * s, (lambda * q).powi(2),
    );
    m
}

/// Legacy five-parameter form. Every state is reachable in one step.
fn symmetric_weights(params: &ParameterVector) -> Matrix4<f64> {
    let ParameterVector {
        p, q, r, s, lambda, ..
    } = *params;
    #[rustfmt::skip]
    let m = Matrix4::new(
        p * p,     p * r,          p * r,          r * r,
        p * s,     p * q,          lambda * r * s, lambda * q * r,
        p * s,     lambda * r * s, p * q,          lambda * q * r,
        s * s,     lambda * q * s, lambda * q * s, (lambda * q).powi(2),
    );
    m
}
