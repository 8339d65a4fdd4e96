//! Stage compiler benchmarks for Drover.
//!
//! Benchmarks for:
//! - Dependency-order traversal
//! - Stage compilation
//! - Plan rendering

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use drover_bench::utils::generate_plan;
use drover_exec::StageCompiler;
use drover_plan::{DependencyOrderWalker, PlanWalker};

/// `(branches, depth)` shapes, from narrow and deep to wide and shallow.
const SHAPES: [(usize, usize); 4] = [(1, 64), (4, 16), (16, 4), (64, 1)];

/// Benchmark dependency-order traversal.
fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan/traversal");

    for (branches, depth) in SHAPES {
        let plan = Arc::new(generate_plan(branches, depth, 42).unwrap());
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{branches}x{depth}")),
            &plan,
            |b, plan| {
                b.iter(|| {
                    let walker = DependencyOrderWalker::new(Arc::clone(plan));
                    black_box(walker.sequence().unwrap())
                })
            },
        );
    }

    group.finish();
}

/// Benchmark stage compilation.
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compiler/compile");
    let compiler = StageCompiler::default();

    for (branches, depth) in SHAPES {
        let plan = Arc::new(generate_plan(branches, depth, 42).unwrap());
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{branches}x{depth}")),
            &plan,
            |b, plan| b.iter(|| black_box(compiler.compile(Arc::clone(plan)).unwrap())),
        );
    }

    group.finish();
}

/// Benchmark stage plan rendering.
fn bench_explain(c: &mut Criterion) {
    let plan = generate_plan(16, 4, 42).unwrap();
    let stages = StageCompiler::default().compile(plan).unwrap();

    c.bench_function("compiler/explain", |b| b.iter(|| black_box(stages.explain())));
}

criterion_group!(benches, bench_traversal, bench_compile, bench_explain);
criterion_main!(benches);
