//! Dataset rows: one parameter vector with its steady state, and the CSV
//! column layout shared by every dataset file.

use serde::{Deserialize, Serialize};

use super::params::{ModelVariant, ParamName, ParameterVector};
use super::state::SteadyState;

/// Columns appended after the parameters in every dataset row.
pub const PROBABILITY_COLUMNS: [&str; 4] = ["p00", "p01", "p10", "p11"];

/// One dataset row: a parameter vector and its steady state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub params: ParameterVector,
    pub steady_state: SteadyState,
}

impl SampleRecord {
    pub fn new(params: ParameterVector, steady_state: SteadyState) -> Self {
        Self {
            params,
            steady_state,
        }
    }

    pub fn p00(&self) -> f64 {
        self.steady_state.p00
    }

    pub fn p11(&self) -> f64 {
        self.steady_state.p11
    }

    /// Row values in header order.
    pub fn values(&self) -> Vec<f64> {
        let mut out = self.params.values();
        out.extend_from_slice(&self.steady_state.as_array());
        out
    }
}

/// Dataset header for a model variant: `p,q,r,s,l[,d],p00,p01,p10,p11`.
pub fn header(variant: ModelVariant) -> Vec<&'static str> {
    variant
        .parameters()
        .iter()
        .map(|name: &ParamName| name.column())
        .chain(PROBABILITY_COLUMNS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_matches_value_layout() {
        let record = SampleRecord::new(
            ParameterVector::competitive(0.1, 0.2, 0.3, 0.4, 1.0, 2.0),
            SteadyState::from_array([0.25; 4]),
        );
        assert_eq!(
            header(ModelVariant::Competitive),
            vec!["p", "q", "r", "s", "l", "d", "p00", "p01", "p10", "p11"]
        );
        assert_eq!(record.values().len(), header(ModelVariant::Competitive).len());
        assert_eq!(header(ModelVariant::Symmetric).len(), 9);
    }
}
