//! Parameter sampler: random draws and 1-D / 2-D sweeps.
//!
//! Base rates `p, q, r, s` live on `[0, 1]`. Interaction factors `λ, δ` are
//! drawn on the unit interval and rescaled into `[0.01, 100]`, either
//! linearly (`uni`) or uniformly in log-space (`loguni`).
//!
//! Sweep output order is the grid order and is part of the contract: rows
//! are later plotted against their sweep position.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{ModelVariant, ParamName, ParameterVector};
use crate::error::ModelError;
use crate::rng::RngHierarchy;

/// Lower bound of the interaction range.
pub const INTERACTION_MIN: f64 = 0.01;
/// Upper bound of the interaction range.
pub const INTERACTION_MAX: f64 = 100.0;

/// How interaction factors are mapped from the unit interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Distribution {
    /// Linear: `0.01 + 99.99·u`.
    #[serde(rename = "uni")]
    Uniform,
    /// Log-space: `10^(4·(u − 0.5))`.
    #[default]
    #[serde(rename = "loguni")]
    LogUniform,
}

impl Distribution {
    pub fn name(self) -> &'static str {
        match self {
            Distribution::Uniform => "uni",
            Distribution::LogUniform => "loguni",
        }
    }

    /// Map `u ∈ [0, 1]` into `[0.01, 100]`.
    pub fn rescale(self, u: f64) -> f64 {
        match self {
            Distribution::Uniform => INTERACTION_MIN + (INTERACTION_MAX - INTERACTION_MIN) * u,
            Distribution::LogUniform => 10f64.powf(4.0 * (u - 0.5)),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Distribution {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uni" | "uniform" => Ok(Distribution::Uniform),
            "loguni" | "log-uniform" | "loguniform" | "log_uniform" => {
                Ok(Distribution::LogUniform)
            }
            _ => Err(ModelError::UnknownDistribution(s.to_string())),
        }
    }
}

impl TryFrom<String> for Distribution {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn default_fixed() -> f64 {
    1.0
}

/// A complete description of which parameter vectors to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SamplingPlan {
    /// `count` independent draws.
    Random {
        #[serde(default)]
        distribution: Distribution,
        count: usize,
    },
    /// One parameter on `count` points of `[0, 1]`, endpoints included.
    Sweep1d {
        parameter: ParamName,
        count: usize,
        #[serde(default = "default_fixed")]
        fixed_value: f64,
        #[serde(default = "default_fixed")]
        fixed_interaction: f64,
        #[serde(default)]
        distribution: Distribution,
        /// Drop the first grid point (value 0, or the interaction floor).
        #[serde(default)]
        exclude_zero: bool,
    },
    /// Two parameters on a `count × count` grid over `(0, 1]`.
    Sweep2d {
        parameters: [ParamName; 2],
        count: usize,
        #[serde(default = "default_fixed")]
        fixed_value: f64,
        #[serde(default = "default_fixed")]
        fixed_interaction: f64,
        #[serde(default)]
        distribution: Distribution,
    },
}

impl SamplingPlan {
    /// Dataset name used when none is configured: `uni`, `sweep-p`, `sweep-pl`, …
    pub fn default_name(&self) -> String {
        match self {
            SamplingPlan::Random { distribution, .. } => distribution.name().to_string(),
            SamplingPlan::Sweep1d { parameter, .. } => format!("sweep-{parameter}"),
            SamplingPlan::Sweep2d { parameters, .. } => {
                format!("sweep-{}{}", parameters[0], parameters[1])
            }
        }
    }

    pub fn count(&self) -> usize {
        match self {
            SamplingPlan::Random { count, .. }
            | SamplingPlan::Sweep1d { count, .. }
            | SamplingPlan::Sweep2d { count, .. } => *count,
        }
    }

    /// Number of rows this plan produces.
    pub fn len(&self) -> usize {
        match self {
            SamplingPlan::Sweep2d { count, .. } => count * count,
            SamplingPlan::Sweep1d {
                count,
                exclude_zero: true,
                ..
            } => count.saturating_sub(1),
            other => other.count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generate every parameter vector of the plan in row order.
    ///
    /// Random rows are drawn from `rngs.rng_for(run, row)`; sweeps ignore `rngs`.
    pub fn generate(
        &self,
        variant: ModelVariant,
        rngs: &RngHierarchy,
        run: &str,
    ) -> Result<Vec<ParameterVector>, ModelError> {
        if self.count() == 0 {
            return Err(ModelError::InvalidParameter(
                "sample count must be positive".into(),
            ));
        }
        match *self {
            SamplingPlan::Random {
                distribution,
                count,
            } => Ok((0..count as u64)
                .map(|row| {
                    let mut rng = rngs.rng_for(run, row);
                    random_sample(&mut rng, variant, distribution)
                })
                .collect()),
            SamplingPlan::Sweep1d {
                parameter,
                count,
                fixed_value,
                fixed_interaction,
                distribution,
                exclude_zero,
            } => {
                let mut rows = sweep_1d(
                    variant,
                    parameter,
                    count,
                    Fixed::new(fixed_value, fixed_interaction)?,
                    distribution,
                )?;
                if exclude_zero {
                    if rows.len() < 2 {
                        return Err(ModelError::InvalidParameter(
                            "a sweep without its zero point needs at least 2 points".into(),
                        ));
                    }
                    rows.remove(0);
                }
                Ok(rows)
            }
            SamplingPlan::Sweep2d {
                parameters,
                count,
                fixed_value,
                fixed_interaction,
                distribution,
            } => sweep_2d(
                variant,
                parameters,
                count,
                Fixed::new(fixed_value, fixed_interaction)?,
                distribution,
            ),
        }
    }
}

/// Values held by the parameters a sweep does not vary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixed {
    pub base: f64,
    pub interaction: f64,
}

impl Fixed {
    pub fn new(base: f64, interaction: f64) -> Result<Self, ModelError> {
        if !base.is_finite() || base < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "fixed base rate must be non-negative, got {base}"
            )));
        }
        if !interaction.is_finite() || interaction <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "fixed interaction must be strictly positive, got {interaction}"
            )));
        }
        Ok(Self { base, interaction })
    }
}

impl Default for Fixed {
    fn default() -> Self {
        Self {
            base: 1.0,
            interaction: 1.0,
        }
    }
}

/// One random parameter vector: base rates on `[0, 1)`, interactions rescaled.
pub fn random_sample<R: Rng + ?Sized>(
    rng: &mut R,
    variant: ModelVariant,
    distribution: Distribution,
) -> ParameterVector {
    let p = rng.gen::<f64>();
    let q = rng.gen::<f64>();
    let r = rng.gen::<f64>();
    let s = rng.gen::<f64>();
    let lambda = distribution.rescale(rng.gen::<f64>());
    match variant {
        ModelVariant::Competitive => {
            let delta = distribution.rescale(rng.gen::<f64>());
            ParameterVector::competitive(p, q, r, s, lambda, delta)
        }
        ModelVariant::Symmetric => ParameterVector::symmetric(p, q, r, s, lambda),
    }
}

/// `n` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// `k / n` for `k = 1..=n`: evenly spaced on `(0, 1]`.
pub fn open_grid(n: usize) -> Vec<f64> {
    (1..=n).map(|k| k as f64 / n as f64).collect()
}

fn axis(name: ParamName, unit: &[f64], distribution: Distribution) -> Vec<f64> {
    if name.is_interaction() {
        unit.iter().map(|&u| distribution.rescale(u)).collect()
    } else {
        unit.to_vec()
    }
}

fn ensure_member(variant: ModelVariant, name: ParamName) -> Result<(), ModelError> {
    if variant.has(name) {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter(format!(
            "{name} is not a parameter of the {variant} model"
        )))
    }
}

/// Vary one parameter over `n` points of `[0, 1]` (rescaled for λ/δ).
pub fn sweep_1d(
    variant: ModelVariant,
    parameter: ParamName,
    n: usize,
    fixed: Fixed,
    distribution: Distribution,
) -> Result<Vec<ParameterVector>, ModelError> {
    ensure_member(variant, parameter)?;
    let base = ParameterVector::filled(variant, fixed.base, fixed.interaction);
    axis(parameter, &linspace(0.0, 1.0, n), distribution)
        .into_iter()
        .map(|value| base.with(parameter, value))
        .collect()
}

/// Cartesian grid over two parameters, first parameter outermost.
pub fn sweep_2d(
    variant: ModelVariant,
    parameters: [ParamName; 2],
    n: usize,
    fixed: Fixed,
    distribution: Distribution,
) -> Result<Vec<ParameterVector>, ModelError> {
    let [first, second] = parameters;
    ensure_member(variant, first)?;
    ensure_member(variant, second)?;
    if first == second {
        return Err(ModelError::InvalidParameter(format!(
            "2-D sweep needs two distinct parameters, got {first} twice"
        )));
    }

    let unit = open_grid(n);
    let outer = axis(first, &unit, distribution);
    let inner = axis(second, &unit, distribution);
    let base = ParameterVector::filled(variant, fixed.base, fixed.interaction);

    let mut out = Vec::with_capacity(n * n);
    for &a in &outer {
        let row = base.with(first, a)?;
        for &b in &inner {
            out.push(row.with(second, b)?);
        }
    }
    Ok(out)
}
