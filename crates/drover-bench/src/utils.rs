//! Benchmark utilities and helpers.

use drover_exec::eval::{CompareOp, ExprSpec};
use drover_exec::physical::{PhysicalKind, PhysicalPlanBuilder};
use drover_exec::{PhysicalPlan, Tuple, Value};
use drover_plan::logical::Literal;
use drover_plan::VisitorResult;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generates random string data for benchmarks.
pub fn random_string(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates a plan of `branches` independent load chains merged by a union
/// and stored.
///
/// Every branch carries up to `depth` operators, each either a pipeline
/// operator or a redistribution. The same seed yields the same plan.
pub fn generate_plan(branches: usize, depth: usize, seed: u64) -> VisitorResult<PhysicalPlan> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = PhysicalPlanBuilder::new("bench");
    let mut heads = Vec::with_capacity(branches);

    for branch in 0..branches {
        let mut head = builder.load(format!("input-{branch}"))?;
        for _ in 0..depth {
            let kind = random_kind(&mut rng);
            head = builder.add(kind, std::slice::from_ref(&head))?;
        }
        heads.push(head);
    }

    let union = builder.add(PhysicalKind::Union, &heads)?;
    builder.store("output", &union)?;
    Ok(builder.build())
}

fn random_kind(rng: &mut StdRng) -> PhysicalKind {
    match rng.gen_range(0..6) {
        0 => PhysicalKind::Filter {
            condition: ExprSpec::compare(
                CompareOp::Gt,
                ExprSpec::column(0),
                ExprSpec::constant(Literal::Int(rng.gen_range(0..100))),
            ),
        },
        1 => PhysicalKind::ForEach {
            generate: vec![ExprSpec::column(0), ExprSpec::column(1)],
        },
        2 => PhysicalKind::Limit {
            count: rng.gen_range(10..1000),
        },
        3 => PhysicalKind::Group {
            keys: vec![0],
            parallelism: Some(rng.gen_range(1..16)),
        },
        4 => PhysicalKind::Distinct { parallelism: None },
        _ => PhysicalKind::Sort {
            keys: vec![0],
            ascending: vec![true],
            parallelism: None,
        },
    }
}

/// Generates `(id, score, name)` tuples; roughly one score in ten is null.
pub fn generate_tuples(count: usize) -> Vec<Tuple> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|i| {
            let score = if rng.gen_ratio(1, 10) {
                Value::Null
            } else {
                Value::double(rng.gen_range(0.0..100.0))
            };
            let name = random_string(&mut rng, 8);
            Tuple::new(vec![Value::long(i as i64), score, Value::chararray(name)])
        })
        .collect()
}
