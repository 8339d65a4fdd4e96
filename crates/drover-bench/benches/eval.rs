//! Evaluation benchmarks for Drover.
//!
//! Benchmarks for:
//! - Short-circuit OR with a true left operand
//! - OR falling through to the right operand
//! - A filter pipeline over in-memory tuples

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use drover_bench::utils::generate_tuples;
use drover_common::KeyGenerator;
use drover_exec::eval::{
    collect_tuples, CompareOp, ExprSpec, ExpressionOperator, FilterTuples, TupleSource,
};
use drover_plan::logical::Literal;

fn or_condition(threshold: i32) -> ExprSpec {
    ExprSpec::or(
        ExprSpec::compare(
            CompareOp::Lt,
            ExprSpec::column(0),
            ExprSpec::constant(Literal::Int(threshold)),
        ),
        ExprSpec::is_null(ExprSpec::column(1)),
    )
}

/// Benchmark a single OR expression.
fn bench_or(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval/or");
    let tuples = generate_tuples(1_000);

    // Every id is below the high threshold and none is below zero.
    for (name, threshold) in [("short_circuit", i32::MAX), ("fall_through", 0)] {
        let mut keys = KeyGenerator::new("bench");
        let mut expr = or_condition(threshold).build(&mut keys);
        group.throughput(Throughput::Elements(tuples.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                for tuple in &tuples {
                    black_box(expr.get_next(tuple));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark filtering tuples through the pull pipeline.
fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval/filter");

    for count in [100, 1_000, 10_000] {
        let tuples = generate_tuples(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &tuples, |b, tuples| {
            b.iter(|| {
                let mut keys = KeyGenerator::new("bench");
                let source = TupleSource::new(keys.next_key(), tuples.iter().cloned());
                let condition = or_condition(count as i32 / 2).build(&mut keys);
                let mut filter = FilterTuples::new(keys.next_key(), Box::new(source), condition);
                black_box(collect_tuples(&mut filter).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_or, bench_filter);
criterion_main!(benches);
