//! Sweep-all batches: one run per parameter, optionally one per parameter pair.

use genepair_core::{Distribution, ModelVariant, SamplingPlan};

use crate::config::RunConfig;

/// Shape shared by every sweep of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepShape {
    pub count: usize,
    pub fixed_value: f64,
    pub fixed_interaction: f64,
    pub distribution: Distribution,
    /// Leave out the first point of 1-D sweeps. With the competitive model
    /// `p = 0` or `q = 0` empties a column, so a full batch under the abort
    /// policy would otherwise always fail.
    pub exclude_zero: bool,
}

impl SweepShape {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            fixed_value: 1.0,
            fixed_interaction: 1.0,
            distribution: Distribution::default(),
            exclude_zero: true,
        }
    }
}

/// Every 1-D sweep of the model, in parameter order, then (if `pairs`) every
/// unordered 2-D pair in lexicographic order.
pub fn sweep_plans(variant: ModelVariant, shape: SweepShape, pairs: bool) -> Vec<SamplingPlan> {
    let names = variant.parameters();
    let mut plans: Vec<SamplingPlan> = names
        .iter()
        .map(|&parameter| SamplingPlan::Sweep1d {
            parameter,
            count: shape.count,
            fixed_value: shape.fixed_value,
            fixed_interaction: shape.fixed_interaction,
            distribution: shape.distribution,
            exclude_zero: shape.exclude_zero,
        })
        .collect();

    if pairs {
        for (i, &first) in names.iter().enumerate() {
            for &second in &names[i + 1..] {
                plans.push(SamplingPlan::Sweep2d {
                    parameters: [first, second],
                    count: shape.count,
                    fixed_value: shape.fixed_value,
                    fixed_interaction: shape.fixed_interaction,
                    distribution: shape.distribution,
                });
            }
        }
    }
    plans
}

/// One config per plan, each inheriting everything but name and sampling from `base`.
pub fn batch_configs(base: &RunConfig, plans: Vec<SamplingPlan>) -> Vec<RunConfig> {
    plans
        .into_iter()
        .map(|sampling| RunConfig {
            name: None,
            sampling,
            ..base.clone()
        })
        .collect()
}
