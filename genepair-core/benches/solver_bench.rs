//! Criterion benchmarks for the per-sample hot path.
//!
//! Benchmarks:
//! 1. Matrix build (both variants)
//! 2. Steady-state solve
//! 3. Full sample → build → solve for a batch of random rows
//! 4. Chain simulation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use genepair_core::{
    evaluate, simulate, steady_state, Distribution, ModelVariant, ParameterVector, RngHierarchy,
    SamplingPlan, SolverConfig, TransitionMatrix,
};

fn bench_build(c: &mut Criterion) {
    let comp = ParameterVector::competitive(0.4, 0.6, 0.3, 0.7, 3.0, 0.5);
    let sym = ParameterVector::symmetric(0.4, 0.6, 0.3, 0.7, 3.0);
    c.bench_function("build_competitive", |b| {
        b.iter(|| TransitionMatrix::build(black_box(&comp), ModelVariant::Competitive))
    });
    c.bench_function("build_symmetric", |b| {
        b.iter(|| TransitionMatrix::build(black_box(&sym), ModelVariant::Symmetric))
    });
}

fn bench_solve(c: &mut Criterion) {
    let params = ParameterVector::competitive(0.4, 0.6, 0.3, 0.7, 3.0, 0.5);
    let tm = TransitionMatrix::build(&params, ModelVariant::Competitive).unwrap();
    c.bench_function("steady_state", |b| b.iter(|| steady_state(black_box(&tm))));
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_build_solve");
    let rngs = RngHierarchy::new(42);
    let solver = SolverConfig::default();
    for n in [100usize, 1_000] {
        let plan = SamplingPlan::Random {
            distribution: Distribution::LogUniform,
            count: n,
        };
        let rows = plan.generate(ModelVariant::Competitive, &rngs, "bench").unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &rows, |b, rows| {
            b.iter(|| {
                rows.iter()
                    .filter_map(|p| evaluate(p, ModelVariant::Competitive, &solver).ok())
                    .count()
            })
        });
    }
    group.finish();
}

fn bench_simulate(c: &mut Criterion) {
    let params = ParameterVector::symmetric(0.4, 0.6, 0.3, 0.7, 3.0);
    let tm = TransitionMatrix::build(&params, ModelVariant::Symmetric).unwrap();
    c.bench_function("simulate_1000", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| simulate(black_box(&tm), 1_000, &mut rng))
    });
}

criterion_group!(benches, bench_build, bench_solve, bench_batch, bench_simulate);
criterion_main!(benches);
