//! Steady-state solver.
//!
//! Eigenvalues come from the real Schur form of the transition matrix. Each
//! real eigenvalue within `tolerance` of 1 (imaginary part within
//! `imaginary_tolerance`) yields a candidate: the right singular vector of
//! `T − μI` with the smallest singular value. A candidate is kept only if all
//! of its components share one sign, up to a global flip. Exactly one
//! candidate must survive; zero or several is an error, never a guess.
//! Complex near-unit eigenvalues are never candidates, and are reported only
//! when no real candidate survives. If the Schur iteration does not converge
//! the stationary vector is read from the null space of `T − I` directly.

use nalgebra::linalg::Schur;
use nalgebra::{Matrix4, Vector4};

use crate::domain::SteadyState;
use crate::error::ModelError;
use crate::matrix::TransitionMatrix;

const MAX_SCHUR_ITERATIONS: usize = 10_000;
/// Schur deflation threshold, relative to the Frobenius norm.
const SCHUR_RELATIVE_EPS: f64 = 1e-12;
/// Singular values below this fraction of the norm count as zero.
const NULL_SPACE_RELATIVE_EPS: f64 = 1e-9;

/// Tolerances used by [`solve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Maximum distance `|λ − 1|` for an eigenvalue to count as the unit eigenvalue.
    pub tolerance: f64,
    /// Components below this fraction of the largest component are treated as zero.
    pub zero_tolerance: f64,
    /// Largest imaginary part that may be discarded on a near-unit eigenvalue.
    pub imaginary_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            zero_tolerance: 1e-12,
            imaginary_tolerance: 1e-9,
        }
    }
}

impl SolverConfig {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }
}

/// Solve with default tolerances.
pub fn steady_state(tm: &TransitionMatrix) -> Result<SteadyState, ModelError> {
    solve(tm, &SolverConfig::default())
}

/// Extract the stationary distribution of `tm`.
pub fn solve(tm: &TransitionMatrix, config: &SolverConfig) -> Result<SteadyState, ModelError> {
    let m = tm.as_matrix();
    let eps = f64::EPSILON.max(SCHUR_RELATIVE_EPS * m.norm());
    let Some(schur) = Schur::try_new(*m, eps, MAX_SCHUR_ITERATIONS) else {
        // A column-stochastic matrix always has eigenvalue 1.
        return unit_null_vector(m, config).map(SteadyState::from_array);
    };

    let mut candidates: Vec<[f64; 4]> = Vec::new();
    let mut complex_near_unit = None;
    for ev in schur.complex_eigenvalues().iter() {
        let distance = (ev.re - 1.0).hypot(ev.im);
        if distance >= config.tolerance {
            continue;
        }
        if ev.im.abs() > config.imaginary_tolerance {
            complex_near_unit.get_or_insert(*ev);
            continue;
        }
        if let Some(v) = eigenvector(m, ev.re).and_then(|v| orient(v, config.zero_tolerance)) {
            candidates.push(v);
        }
    }

    match (candidates.as_slice(), complex_near_unit) {
        ([v], _) => Ok(SteadyState::from_array(to_probabilities(*v))),
        ([], Some(ev)) => Err(ModelError::ComplexEigenvalue {
            re: ev.re,
            im: ev.im,
        }),
        _ => Err(ModelError::EigenvectorNotFound {
            candidates: candidates.len(),
        }),
    }
}

/// Null vector of `T − I`, used when the Schur iteration does not converge.
///
/// More than one numerically zero singular value means more than one
/// stationary distribution.
fn unit_null_vector(m: &Matrix4<f64>, config: &SolverConfig) -> Result<[f64; 4], ModelError> {
    let shifted = m - Matrix4::identity();
    let svd = shifted.svd(false, true);
    let threshold = NULL_SPACE_RELATIVE_EPS * m.norm().max(1.0);
    let null_dim = svd
        .singular_values
        .iter()
        .filter(|s| **s <= threshold)
        .count();
    if null_dim > 1 {
        return Err(ModelError::EigenvectorNotFound {
            candidates: null_dim,
        });
    }
    let smallest = svd.singular_values.imin();
    svd.v_t
        .map(|v_t| v_t.row(smallest).transpose())
        .and_then(|v| orient(v, config.zero_tolerance))
        .map(to_probabilities)
        .ok_or(ModelError::EigenvectorNotFound { candidates: 0 })
}

/// Unit vector spanning (numerically) the null space of `m − μI`.
fn eigenvector(m: &Matrix4<f64>, mu: f64) -> Option<Vector4<f64>> {
    let shifted = m - Matrix4::identity() * mu;
    let svd = shifted.svd(false, true);
    let smallest = svd.singular_values.imin();
    let v_t = svd.v_t?;
    Some(v_t.row(smallest).transpose())
}

/// Flip `v` so its components are non-negative, or `None` if the signs are mixed.
fn orient(v: Vector4<f64>, zero_tolerance: f64) -> Option<[f64; 4]> {
    let scale = v.amax();
    if !scale.is_finite() || scale == 0.0 {
        return None;
    }

    let mut out = [0.0; 4];
    let mut nonzero = 0;
    let mut sign_sum = 0.0;
    for (i, &x) in v.iter().enumerate() {
        if x.abs() <= zero_tolerance * scale {
            continue;
        }
        nonzero += 1;
        sign_sum += x.signum();
        out[i] = x;
    }

    if nonzero == 0 || sign_sum.abs() as usize != nonzero {
        return None;
    }
    let flip = sign_sum.signum();
    Some(out.map(|x| x * flip))
}

fn to_probabilities(v: [f64; 4]) -> [f64; 4] {
    let total: f64 = v.iter().sum();
    v.map(|x| x / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelVariant, ParameterVector};

    fn assert_stationary(tm: &TransitionMatrix, ss: &SteadyState) {
        let next = tm.propagate(ss.as_array());
        for (a, b) in next.iter().zip(ss.as_array()) {
            assert!((a - b).abs() < 1e-9, "{next:?} vs {ss:?}");
        }
    }

    #[test]
    fn unit_parameters_give_uniform_steady_state() {
        for (params, variant) in [
            (
                ParameterVector::symmetric(1.0, 1.0, 1.0, 1.0, 1.0),
                ModelVariant::Symmetric,
            ),
            (
                ParameterVector::competitive(1.0, 1.0, 1.0, 1.0, 1.0, 1.0),
                ModelVariant::Competitive,
            ),
        ] {
            let tm = TransitionMatrix::build(&params, variant).unwrap();
            let ss = steady_state(&tm).unwrap();
            for p in ss.as_array() {
                assert!((p - 0.25).abs() < 1e-9, "{variant}: {ss:?}");
            }
        }
    }

    #[test]
    fn solution_is_stationary_under_the_chain() {
        let params = ParameterVector::competitive(0.7, 0.2, 0.4, 0.9, 12.0, 0.05);
        let tm = TransitionMatrix::build(&params, ModelVariant::Competitive).unwrap();
        let ss = steady_state(&tm).unwrap();
        assert!((ss.total() - 1.0).abs() < 1e-12);
        assert!(ss.as_array().iter().all(|p| *p >= 0.0));
        assert_stationary(&tm, &ss);
    }

    #[test]
    fn absorbing_state_resolves_with_zero_components() {
        #[rustfmt::skip]
        let weights = Matrix4::new(
            1.0, 0.2, 0.2, 0.1,
            0.0, 0.3, 0.2, 0.3,
            0.0, 0.2, 0.3, 0.3,
            0.0, 0.3, 0.3, 0.3,
        );
        let tm = TransitionMatrix::from_weights(weights).unwrap();
        let ss = steady_state(&tm).unwrap();
        assert!((ss.p00 - 1.0).abs() < 1e-9);
        assert!(ss.p01.abs() < 1e-9 && ss.p10.abs() < 1e-9 && ss.p11.abs() < 1e-9);
    }

    #[test]
    fn periodic_chain_has_two_unit_eigenvalues() {
        // 00 <-> 11 and 01 <-> 10: eigenvalues {1, 1, -1, -1}.
        #[rustfmt::skip]
        let weights = Matrix4::new(
            0.0, 0.0, 0.0, 1.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            1.0, 0.0, 0.0, 0.0,
        );
        let tm = TransitionMatrix::from_weights(weights).unwrap();
        assert!(matches!(
            steady_state(&tm),
            Err(ModelError::EigenvectorNotFound { .. })
        ));
    }

    #[test]
    fn identity_chain_is_rejected() {
        let tm = TransitionMatrix::from_weights(Matrix4::identity()).unwrap();
        assert!(matches!(
            steady_state(&tm),
            Err(ModelError::EigenvectorNotFound { .. })
        ));
    }

    #[test]
    fn repeated_eigenvalues_still_solve() {
        // Symmetric, doubly stochastic, with a repeated non-unit eigenvalue.
        for a in [0.5, 0.73, 0.84] {
            let params = ParameterVector::competitive(a, a, 1.0, 1.0, 1.0, 1.0);
            let tm = TransitionMatrix::build(&params, ModelVariant::Competitive).unwrap();
            let ss = steady_state(&tm).unwrap();
            for p in ss.as_array() {
                assert!((p - 0.25).abs() < 1e-9, "a = {a}: {ss:?}");
            }
        }
    }

    #[test]
    fn null_vector_path_recovers_uniform_distribution() {
        let params = ParameterVector::competitive(0.73, 0.73, 1.0, 1.0, 1.0, 1.0);
        let tm = TransitionMatrix::build(&params, ModelVariant::Competitive).unwrap();
        let v = unit_null_vector(tm.as_matrix(), &SolverConfig::default()).unwrap();
        for p in v {
            assert!((p - 0.25).abs() < 1e-9, "{v:?}");
        }
    }

    #[test]
    fn null_vector_path_rejects_two_closed_classes() {
        #[rustfmt::skip]
        let weights = Matrix4::new(
            0.0, 0.0, 0.0, 1.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            1.0, 0.0, 0.0, 0.0,
        );
        let tm = TransitionMatrix::from_weights(weights).unwrap();
        assert_eq!(
            unit_null_vector(tm.as_matrix(), &SolverConfig::default()),
            Err(ModelError::EigenvectorNotFound { candidates: 2 })
        );
    }

    #[test]
    fn complex_pair_near_one_does_not_hide_the_stationary_vector() {
        // Slow rotation 00 -> 01 -> 10 -> 11 -> 00: eigenvalues 1, 0.9999 ± 1e-4 i, 0.9998.
        let stay = 0.9999;
        let step = 1e-4;
        #[rustfmt::skip]
        let weights = Matrix4::new(
            stay, 0.0,  0.0,  step,
            step, stay, 0.0,  0.0,
            0.0,  step, stay, 0.0,
            0.0,  0.0,  step, stay,
        );
        let tm = TransitionMatrix::from_weights(weights).unwrap();
        let ss = steady_state(&tm).unwrap();
        for p in ss.as_array() {
            assert!((p - 0.25).abs() < 1e-9, "{ss:?}");
        }
        assert_stationary(&tm, &ss);
    }

    #[test]
    fn orient_flips_all_negative_vectors() {
        let v = Vector4::new(-0.5, -0.5, -0.5, -0.5);
        assert_eq!(orient(v, 1e-12), Some([0.5; 4]));
        let mixed = Vector4::new(0.5, -0.5, 0.5, 0.5);
        assert_eq!(orient(mixed, 1e-12), None);
    }

    #[test]
    fn solver_is_deterministic() {
        let params = ParameterVector::symmetric(0.33, 0.81, 0.12, 0.57, 43.0);
        let a = steady_state(&TransitionMatrix::build(&params, ModelVariant::Symmetric).unwrap())
            .unwrap();
        let b = steady_state(&TransitionMatrix::build(&params, ModelVariant::Symmetric).unwrap())
            .unwrap();
        assert_eq!(a, b);
    }
}
