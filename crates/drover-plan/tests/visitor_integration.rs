//! Integration tests for logical plan traversal.
//!
//! The fixture nests every structural operator so a single walk exercises
//! each per-variant traversal rule, sub-plan entry and walker restoration.

use std::collections::HashMap;
use std::sync::Arc;

use drover_common::{DroverError, ErrorCode, KeyGenerator, OperatorKey};
use drover_plan::logical::{
    walk_user_func, BinCond, Binary, BinaryOp, Cast, Cogroup, Const, DataType, Filter, ForEach,
    Generate, Literal, Load, LogicalOperator, LogicalPlan, LogicalVisitor, Project, Regexp, Sort,
    Split, Store, Unary, UnaryOp, UserFunc,
};
use drover_plan::{
    DependencyOrderWalker, DepthFirstWalker, PlanNode, PlanWalker, VisitorError, VisitorResult,
    WalkerStack,
};

/// Hands out keys and remembers every key issued.
struct Keys {
    gen: KeyGenerator,
    issued: Vec<OperatorKey>,
}

impl Keys {
    fn new() -> Self {
        Self {
            gen: KeyGenerator::new("it"),
            issued: Vec::new(),
        }
    }

    fn next(&mut self) -> OperatorKey {
        let key = self.gen.next_key();
        self.issued.push(key.clone());
        key
    }

    fn int(&mut self, value: i64) -> Arc<LogicalOperator> {
        LogicalOperator::from(Const {
            key: self.next(),
            value: Literal::Int(value),
        })
        .shared()
    }
}

fn expr_plan(op: impl Into<LogicalOperator>) -> Arc<LogicalPlan> {
    let mut plan = LogicalPlan::new();
    plan.add(op.into()).unwrap();
    Arc::new(plan)
}

struct Fixture {
    plan: Arc<LogicalPlan>,
    /// Every key reachable through the default traversal.
    reachable: Vec<OperatorKey>,
    /// A constant only reachable through a sentinel projection.
    hidden: OperatorKey,
}

/// Builds
///
/// ```text
/// load_a -> filter --\
///                     cogroup -> foreach -> split -> sort -> store
/// load_b ------------/
/// ```
///
/// with integer constants 1..=12 placed so that a correct traversal meets
/// them in ascending order.
fn fixture() -> Fixture {
    let mut k = Keys::new();

    let load_a = Load {
        key: k.next(),
        location: "a".into(),
    };
    let load_b = Load {
        key: k.next(),
        location: "b".into(),
    };

    // filter: (project(cast(1)) > 2)
    let one = k.int(1);
    let cast = LogicalOperator::from(Cast {
        key: k.next(),
        expression: one,
        to: DataType::Long,
    })
    .shared();
    let project = LogicalOperator::from(Project {
        key: k.next(),
        expression: cast,
        columns: vec![0],
        sentinel: false,
    })
    .shared();
    let two = k.int(2);
    let condition = Binary {
        key: k.next(),
        op: BinaryOp::Greater,
        lhs: project,
        rhs: two,
    };
    let filter = Filter {
        key: k.next(),
        condition: expr_plan(condition),
    };

    // cogroup: filter by [3, -, 4], load_b by [5 ? project(99) : 6]
    let three = k.int(3);
    let four = k.int(4);
    let five = k.int(5);
    let hidden_const = LogicalOperator::from(Const {
        key: k.gen.next_key(),
        value: Literal::Int(99),
    })
    .shared();
    let hidden = hidden_const.key().clone();
    let resolved = LogicalOperator::from(Project {
        key: k.next(),
        expression: hidden_const,
        columns: vec![1],
        sentinel: true,
    })
    .shared();
    let six = k.int(6);
    let bin_cond = BinCond {
        key: k.next(),
        cond: five,
        lhs: resolved,
        rhs: six,
    };
    let cogroup = Cogroup::new(k.next())
        .with_input(
            filter.key.clone(),
            vec![
                Some(expr_plan(LogicalOperator::clone(&three))),
                None,
                Some(expr_plan(LogicalOperator::clone(&four))),
            ],
        )
        .with_input(load_b.key.clone(), vec![Some(expr_plan(bin_cond))]);

    // foreach { generate Count(7, 8), regexp(9) }
    let seven = k.int(7);
    let eight = k.int(8);
    let count = UserFunc {
        key: k.next(),
        name: "Count".into(),
        args: vec![seven, eight],
    };
    let nine = k.int(9);
    let regexp = Regexp {
        key: k.next(),
        operand: nine,
        pattern: "^a.*".into(),
    };
    let generate = Generate {
        key: k.next(),
        plans: vec![expr_plan(count), expr_plan(regexp)],
        flatten: vec![false, false],
    };
    let for_each = ForEach {
        key: k.next(),
        plan: expr_plan(generate),
    };

    // split on [not 10, -, 11], sort by 12
    let ten = k.int(10);
    let not = Unary {
        key: k.next(),
        op: UnaryOp::Not,
        operand: ten,
    };
    let eleven = k.int(11);
    let split = Split {
        key: k.next(),
        conditions: vec![
            Some(expr_plan(not)),
            None,
            Some(expr_plan(LogicalOperator::clone(&eleven))),
        ],
    };
    let twelve = k.int(12);
    let sort = Sort {
        key: k.next(),
        sort_plans: vec![expr_plan(LogicalOperator::clone(&twelve))],
        ascending: vec![true],
        requested_parallelism: None,
    };
    let store = Store {
        key: k.next(),
        location: "out".into(),
    };

    let mut plan = LogicalPlan::new();
    let a = plan.add(load_a.into()).unwrap().key().clone();
    let b = plan.add(load_b.into()).unwrap().key().clone();
    let f = plan.add_with_inputs(filter.into(), &[a]).unwrap().key().clone();
    let cg = plan
        .add_with_inputs(cogroup.into(), &[f, b])
        .unwrap()
        .key()
        .clone();
    let fe = plan
        .add_with_inputs(for_each.into(), &[cg])
        .unwrap()
        .key()
        .clone();
    let sp = plan.add_with_inputs(split.into(), &[fe]).unwrap().key().clone();
    let so = plan.add_with_inputs(sort.into(), &[sp]).unwrap().key().clone();
    plan.add_with_inputs(store.into(), &[so]).unwrap();
    plan.validate().unwrap();

    Fixture {
        plan: Arc::new(plan),
        reachable: k.issued,
        hidden,
    }
}

/// Records every dispatch and the walker in effect at each integer constant.
struct Tracer {
    walkers: WalkerStack<LogicalOperator>,
    nested_depth_first: bool,
    visits: Vec<OperatorKey>,
    constants: Vec<(i64, &'static str, usize)>,
}

impl Tracer {
    fn new(plan: Arc<LogicalPlan>) -> Self {
        Self {
            walkers: WalkerStack::new(Box::new(DependencyOrderWalker::new(plan))),
            nested_depth_first: false,
            visits: Vec::new(),
            constants: Vec::new(),
        }
    }

    fn values(&self) -> Vec<i64> {
        self.constants.iter().map(|(v, _, _)| *v).collect()
    }
}

impl LogicalVisitor for Tracer {
    fn walkers(&mut self) -> &mut WalkerStack<LogicalOperator> {
        &mut self.walkers
    }

    fn sub_plan_walker(&self, plan: Arc<LogicalPlan>) -> Box<dyn PlanWalker<LogicalOperator>> {
        if self.nested_depth_first {
            Box::new(DepthFirstWalker::new(plan))
        } else {
            Box::new(DependencyOrderWalker::new(plan))
        }
    }

    fn on_operator(&mut self, op: &LogicalOperator) -> VisitorResult<()> {
        self.visits.push(op.key().clone());
        Ok(())
    }

    fn visit_const(&mut self, constant: &Const) -> VisitorResult<()> {
        if let Literal::Int(v) = constant.value {
            let walker = self.walkers.current().name();
            self.constants.push((v, walker, self.walkers.depth()));
        }
        Ok(())
    }
}

/// Overrides nothing.
struct NoOp {
    walkers: WalkerStack<LogicalOperator>,
}

impl LogicalVisitor for NoOp {
    fn walkers(&mut self) -> &mut WalkerStack<LogicalOperator> {
        &mut self.walkers
    }
}

#[test]
fn test_traversal_order_matches_variant_rules() {
    let fixture = fixture();
    let mut tracer = Tracer::new(Arc::clone(&fixture.plan));
    tracer.visit().unwrap();

    assert_eq!(tracer.values(), (1..=12).collect::<Vec<_>>());
    assert_eq!(tracer.walkers.depth(), 1);
}

#[test]
fn test_every_reachable_operator_visited_exactly_once() {
    let fixture = fixture();
    let mut tracer = Tracer::new(Arc::clone(&fixture.plan));
    tracer.visit().unwrap();

    let mut counts: HashMap<&OperatorKey, usize> = HashMap::new();
    for key in &tracer.visits {
        *counts.entry(key).or_default() += 1;
    }
    for key in &fixture.reachable {
        assert_eq!(counts.get(key), Some(&1), "{key} visit count");
    }
    assert_eq!(tracer.visits.len(), fixture.reachable.len());
    assert!(!counts.contains_key(&fixture.hidden));
}

#[test]
fn test_no_op_visitor_terminates() {
    let fixture = fixture();
    let mut visitor = NoOp {
        walkers: WalkerStack::new(Box::new(DepthFirstWalker::new(Arc::clone(&fixture.plan)))),
    };
    visitor.visit().unwrap();
    assert_eq!(visitor.walkers.depth(), 1);
    assert_eq!(visitor.walkers.current().name(), "depth-first");
}

#[test]
fn test_sub_plans_use_scoped_walker() {
    let fixture = fixture();

    let mut tracer = Tracer::new(Arc::clone(&fixture.plan));
    tracer.visit().unwrap();
    assert!(tracer
        .constants
        .iter()
        .all(|(_, walker, _)| *walker == "dependency-order"));

    let mut tracer = Tracer::new(Arc::clone(&fixture.plan));
    tracer.nested_depth_first = true;
    tracer.visit().unwrap();
    assert!(tracer
        .constants
        .iter()
        .all(|(_, walker, _)| *walker == "depth-first"));

    // Constants 7..=9 sit inside generate, inside foreach: two sub-plans deep.
    let depths: HashMap<i64, usize> = tracer
        .constants
        .iter()
        .map(|(v, _, depth)| (*v, *depth))
        .collect();
    assert_eq!(depths[&1], 2);
    assert_eq!(depths[&7], 3);
    assert_eq!(depths[&9], 3);
    assert_eq!(depths[&12], 2);
    assert_eq!(tracer.walkers.depth(), 1);
    assert_eq!(tracer.walkers.current().name(), "dependency-order");
}

fn projection_plan(sentinel: bool) -> (Arc<LogicalPlan>, OperatorKey) {
    let mut keys = KeyGenerator::new("p");
    let target = LogicalOperator::from(Const {
        key: keys.next_key(),
        value: Literal::CharArray("x".into()),
    })
    .shared();
    let target_key = target.key().clone();
    let project = Project {
        key: keys.next_key(),
        expression: target,
        columns: vec![0],
        sentinel,
    };
    (expr_plan(project), target_key)
}

#[test]
fn test_project_sentinel() {
    for (sentinel, expected) in [(true, 0), (false, 1)] {
        let (plan, target) = projection_plan(sentinel);
        let mut tracer = Tracer::new(plan);
        tracer.visit().unwrap();
        let hits = tracer.visits.iter().filter(|k| **k == target).count();
        assert_eq!(hits, expected, "sentinel = {sentinel}");
    }
}

#[test]
fn test_visitor_error_aborts_traversal() {
    struct RejectFunctions {
        walkers: WalkerStack<LogicalOperator>,
        after: usize,
        failed: bool,
    }

    impl LogicalVisitor for RejectFunctions {
        fn walkers(&mut self) -> &mut WalkerStack<LogicalOperator> {
            &mut self.walkers
        }

        fn on_operator(&mut self, _op: &LogicalOperator) -> VisitorResult<()> {
            if self.failed {
                self.after += 1;
            }
            Ok(())
        }

        fn visit_user_func(&mut self, func: &UserFunc) -> VisitorResult<()> {
            walk_user_func(self, func)?;
            self.failed = true;
            Err(VisitorError::aborted(&func.key, "functions are not allowed"))
        }
    }

    let fixture = fixture();
    let mut visitor = RejectFunctions {
        walkers: WalkerStack::new(Box::new(DependencyOrderWalker::new(fixture.plan))),
        after: 0,
        failed: false,
    };
    let err = visitor.visit().unwrap_err();

    assert!(matches!(err, VisitorError::Aborted { .. }));
    assert_eq!(visitor.after, 0);
    assert_eq!(visitor.walkers.depth(), 1);

    let err = DroverError::from(err);
    assert_eq!(err.code(), ErrorCode::Traversal);
}

#[test]
fn test_cyclic_plan_is_rejected() {
    let mut keys = KeyGenerator::new("c");
    let mut plan = LogicalPlan::new();
    let mut ids = Vec::new();
    for location in ["a", "b"] {
        let op = plan
            .add(
                Load {
                    key: keys.next_key(),
                    location: location.into(),
                }
                .into(),
            )
            .unwrap();
        ids.push(op.key().clone());
    }
    plan.connect(&ids[0], &ids[1]).unwrap();
    plan.connect(&ids[1], &ids[0]).unwrap();

    let mut visitor = NoOp {
        walkers: WalkerStack::new(Box::new(DependencyOrderWalker::new(Arc::new(plan)))),
    };
    let err = visitor.visit().unwrap_err();
    assert!(matches!(err, VisitorError::Cycle(_)));
    assert_eq!(DroverError::from(err).code(), ErrorCode::PlanStructure);
}

#[test]
fn test_depth_first_rejects_cycle_reachable_from_root() {
    let mut keys = KeyGenerator::new("r");
    let mut plan = LogicalPlan::new();
    let mut ids = Vec::new();
    for location in ["root", "a", "b"] {
        let op = plan
            .add(
                Load {
                    key: keys.next_key(),
                    location: location.into(),
                }
                .into(),
            )
            .unwrap();
        ids.push(op.key().clone());
    }
    plan.connect(&ids[0], &ids[1]).unwrap();
    plan.connect(&ids[1], &ids[2]).unwrap();
    plan.connect(&ids[2], &ids[1]).unwrap();

    let walker = DepthFirstWalker::new(Arc::new(plan));
    assert!(matches!(walker.sequence(), Err(VisitorError::Cycle(_))));
}

#[test]
fn test_operator_names() {
    let fixture = fixture();
    let names: Vec<String> = fixture.plan.operators().map(|op| op.name()).collect();
    assert_eq!(names[0], "Load - it-1");
    assert!(names.iter().any(|n| n.starts_with("Cogroup - ")));
    assert!(names.iter().any(|n| n.starts_with("ForEach - ")));
}
