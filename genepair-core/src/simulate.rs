//! Chain simulator: one random walk through the joint state space.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::domain::JointState;
use crate::error::ModelError;
use crate::matrix::TransitionMatrix;

/// States visited at `t = 0, 1, …, t_max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeries {
    states: Vec<JointState>,
}

impl TimeSeries {
    /// Wrap states already ordered by time step.
    pub fn from_states(states: Vec<JointState>) -> Self {
        Self { states }
    }

    pub fn states(&self) -> &[JointState] {
        &self.states
    }

    /// `(time, state)` rows in increasing time order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, JointState)> + '_ {
        self.states.iter().copied().enumerate()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Fraction of time steps spent in each state, indexed like [`JointState::ALL`].
    pub fn occupancy(&self) -> [f64; 4] {
        let mut counts = [0usize; 4];
        for state in &self.states {
            counts[state.index()] += 1;
        }
        let total = self.states.len().max(1) as f64;
        counts.map(|c| c as f64 / total)
    }
}

/// Sample the successor of `current` from its column of `tm`.
pub fn next_state<R: Rng + ?Sized>(
    tm: &TransitionMatrix,
    current: JointState,
    rng: &mut R,
    step: usize,
) -> Result<JointState, ModelError> {
    let column = tm.column(current);
    let dist = WeightedIndex::new(column).map_err(|e| ModelError::SimulationFailed {
        step,
        reason: format!("column {current} is not a probability vector: {e}"),
    })?;
    JointState::from_index(dist.sample(rng)).ok_or_else(|| ModelError::SimulationFailed {
        step,
        reason: "sampled state index out of range".into(),
    })
}

/// Walk the chain for `t_max` steps from a uniformly random initial state.
///
/// The result always has `t_max + 1` rows.
pub fn simulate<R: Rng + ?Sized>(
    tm: &TransitionMatrix,
    t_max: usize,
    rng: &mut R,
) -> Result<TimeSeries, ModelError> {
    let mut states = Vec::with_capacity(t_max + 1);
    let mut current = JointState::ALL[rng.gen_range(0..JointState::ALL.len())];
    states.push(current);
    for step in 1..=t_max {
        current = next_state(tm, current, rng, step)?;
        states.push(current);
    }
    Ok(TimeSeries { states })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelVariant, ParameterVector};
    use crate::steady_state::steady_state;
    use nalgebra::Matrix4;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn series_has_t_max_plus_one_rows() {
        let params = ParameterVector::competitive(0.5, 0.5, 0.5, 0.5, 1.0, 1.0);
        let tm = TransitionMatrix::build(&params, ModelVariant::Competitive).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let ts = simulate(&tm, 100, &mut rng).unwrap();
        assert_eq!(ts.len(), 101);
        for (expected, (t, _)) in ts.rows().enumerate() {
            assert_eq!(t, expected);
        }
    }

    #[test]
    fn zero_horizon_is_just_the_initial_state() {
        let tm = TransitionMatrix::from_weights(Matrix4::repeat(1.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(simulate(&tm, 0, &mut rng).unwrap().len(), 1);
    }

    #[test]
    fn structural_zeros_are_never_crossed() {
        // Competitive form: 00 never jumps straight to 11 and vice versa.
        let params = ParameterVector::competitive(0.6, 0.6, 0.4, 0.4, 1.0, 1.0);
        let tm = TransitionMatrix::build(&params, ModelVariant::Competitive).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let ts = simulate(&tm, 5_000, &mut rng).unwrap();
        for pair in ts.states().windows(2) {
            let jump = (pair[0], pair[1]);
            assert_ne!(jump, (JointState::S00, JointState::S11));
            assert_ne!(jump, (JointState::S11, JointState::S00));
        }
    }

    #[test]
    fn long_run_occupancy_approaches_steady_state() {
        let params = ParameterVector::symmetric(0.4, 0.7, 0.3, 0.6, 2.0);
        let tm = TransitionMatrix::build(&params, ModelVariant::Symmetric).unwrap();
        let ss = steady_state(&tm).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);
        let ts = simulate(&tm, 200_000, &mut rng).unwrap();
        for (emp, exact) in ts.occupancy().iter().zip(ss.as_array()) {
            assert!((emp - exact).abs() < 0.02, "{emp} vs {exact}");
        }
    }
}
