//! Joint on/off state space and the steady-state distribution over it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Joint state of the two genes. The first digit is gene 1, the second gene 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JointState {
    S00,
    S01,
    S10,
    S11,
}

impl JointState {
    pub const ALL: [JointState; 4] = [
        JointState::S00,
        JointState::S01,
        JointState::S10,
        JointState::S11,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            JointState::S00 => "00",
            JointState::S01 => "01",
            JointState::S10 => "10",
            JointState::S11 => "11",
        }
    }

    /// 1 if gene 1 is on.
    pub fn gene1(self) -> u8 {
        matches!(self, JointState::S10 | JointState::S11) as u8
    }

    /// 1 if gene 2 is on.
    pub fn gene2(self) -> u8 {
        matches!(self, JointState::S01 | JointState::S11) as u8
    }
}

impl fmt::Display for JointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses the two-digit label, as written in `p00`-style column names.
impl FromStr for JointState {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        let label = label.strip_prefix('p').unwrap_or(label);
        Self::ALL
            .into_iter()
            .find(|state| state.label() == label)
            .ok_or_else(|| {
                ModelError::InvalidParameter(format!(
                    "unknown joint state '{s}' (expected one of 00, 01, 10, 11)"
                ))
            })
    }
}

/// Stationary distribution `(p00, p01, p10, p11)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteadyState {
    pub p00: f64,
    pub p01: f64,
    pub p10: f64,
    pub p11: f64,
}

impl SteadyState {
    pub fn from_array(probs: [f64; 4]) -> Self {
        Self {
            p00: probs[0],
            p01: probs[1],
            p10: probs[2],
            p11: probs[3],
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.p00, self.p01, self.p10, self.p11]
    }

    pub fn probability(&self, state: JointState) -> f64 {
        self.as_array()[state.index()]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}
