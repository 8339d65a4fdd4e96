//! Splits a physical plan into stages at redistribution boundaries.

use std::sync::Arc;

use drover_common::config::CompilerConfig;
use drover_common::{OperatorKey, StageId};
use drover_plan::{DependencyOrderWalker, PlanNode, PlanWalker, VisitorError, VisitorResult};
use tracing::{debug, info};

use super::error::{CompileError, CompileResult};
use super::stage::{StageKind, StagePlan};
use crate::physical::{PhysicalKind, PhysicalOperator, PhysicalPlan, PhysicalVisitor};

/// Compiles physical plans into stage DAGs.
///
/// Operators are visited in dependency order. Each operator joins the stage
/// of its input unless it needs repartitioned input, in which case it opens a
/// new stage downstream of every stage feeding it.
///
/// # Example
///
/// ```rust
/// use drover_common::config::CompilerConfig;
/// use drover_exec::physical::{PhysicalKind, PhysicalPlanBuilder};
/// use drover_exec::StageCompiler;
///
/// let mut builder = PhysicalPlanBuilder::new("doc");
/// let load = builder.load("input").unwrap();
/// let group = builder
///     .add(PhysicalKind::Group { keys: vec![0], parallelism: Some(4) }, &[load])
///     .unwrap();
/// builder.store("output", &group).unwrap();
///
/// let stages = StageCompiler::new(CompilerConfig::default())
///     .compile(builder.build())
///     .unwrap();
/// assert_eq!(stages.len(), 2);
/// assert_eq!(stages.stages()[1].parallelism, 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StageCompiler {
    config: CompilerConfig,
}

impl StageCompiler {
    /// Creates a compiler.
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Returns the compiler configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles `plan` into stages.
    pub fn compile(&self, plan: impl Into<Arc<PhysicalPlan>>) -> CompileResult<StagePlan> {
        let plan = plan.into();
        if plan.is_empty() {
            return Err(CompileError::EmptyPlan);
        }
        plan.validate()?;
        for op in plan.operators() {
            check_inputs(&plan, op)?;
        }

        let mut partitioner = Partitioner {
            walker: DependencyOrderWalker::new(Arc::clone(&plan)),
            config: &self.config,
            stages: StagePlan::new(Arc::clone(&plan)),
            failure: None,
        };
        let result = partitioner.visit();
        if let Some(err) = partitioner.failure.take() {
            return Err(err);
        }
        result?;

        let stages = partitioner.stages;
        stages.validate()?;
        info!(
            operators = plan.len(),
            stages = stages.len(),
            "Compiled physical plan"
        );
        Ok(stages)
    }
}

/// Checks an operator's inputs against its arity and its plan predecessors,
/// and rejects a requested parallelism of zero.
fn check_inputs(plan: &PhysicalPlan, op: &PhysicalOperator) -> CompileResult<()> {
    if op.kind.requested_parallelism() == Some(0) {
        return Err(CompileError::ZeroParallelism(op.key.clone()));
    }

    let found = op.inputs.len();
    let (min, max) = op.kind.arity();
    if found < min || max.is_some_and(|max| found > max) {
        let expected = match max {
            Some(max) if max == min => min.to_string(),
            Some(max) => format!("{min} to {max}"),
            None => format!("at least {min}"),
        };
        return Err(CompileError::Arity {
            operator: op.key.clone(),
            expected,
            found,
        });
    }

    if let PhysicalKind::Cogroup { keys, .. } | PhysicalKind::Join { keys, .. } = &op.kind {
        if keys.len() != found {
            return Err(CompileError::Arity {
                operator: op.key.clone(),
                expected: keys.len().to_string(),
                found,
            });
        }
    }

    if let Some(extra) = plan
        .predecessors(&op.key)
        .iter()
        .find(|pred| !op.inputs.contains(pred))
    {
        return Err(VisitorError::UnresolvedInput {
            operator: op.key.clone(),
            input: extra.clone(),
        }
        .into());
    }
    Ok(())
}

/// Visitor assigning operators to stages.
struct Partitioner<'a> {
    walker: DependencyOrderWalker<PhysicalOperator>,
    config: &'a CompilerConfig,
    stages: StagePlan,
    failure: Option<CompileError>,
}

impl Partitioner<'_> {
    /// Returns the distinct stages producing the inputs of `op`, in input order.
    fn input_stages(&mut self, op: &PhysicalOperator) -> VisitorResult<Vec<StageId>> {
        let mut stages = Vec::with_capacity(op.inputs.len());
        for input in &op.inputs {
            let Some(stage) = self.stages.stage_of(input) else {
                return Err(self.fail(op, CompileError::MissingStage(op.key.clone())));
            };
            if !stages.contains(&stage) {
                stages.push(stage);
            }
        }
        Ok(stages)
    }

    /// Records a compile failure and aborts the walk.
    fn fail(&mut self, op: &PhysicalOperator, err: CompileError) -> VisitorError {
        let abort = VisitorError::aborted(&op.key, err.to_string());
        self.failure = Some(err);
        abort
    }

    fn open(&mut self, kind: StageKind, parallelism: usize, boundary: Option<&OperatorKey>) -> StageId {
        let id = self.stages.open(kind, parallelism, boundary.cloned());
        debug!(stage = %id, %kind, parallelism, "Opened stage");
        id
    }

    /// Adds `op` to the single stage feeding it.
    fn continue_stage(&mut self, op: &PhysicalOperator) -> VisitorResult<()> {
        let inputs = self.input_stages(op)?;
        match inputs.as_slice() {
            [stage] => {
                self.stages.assign(&op.key, *stage);
                Ok(())
            }
            _ => Err(self.fail(op, CompileError::MissingStage(op.key.clone()))),
        }
    }

    fn shuffle_parallelism(&self, op: &PhysicalOperator) -> usize {
        op.kind
            .requested_parallelism()
            .unwrap_or(self.config.default_parallelism)
    }
}

impl PhysicalVisitor for Partitioner<'_> {
    fn walker(&self) -> &dyn PlanWalker<PhysicalOperator> {
        &self.walker
    }

    fn visit_load(&mut self, op: &PhysicalOperator) -> VisitorResult<()> {
        let stage = self.open(StageKind::Source, self.config.default_parallelism, None);
        self.stages.assign(&op.key, stage);
        Ok(())
    }

    fn visit_store(&mut self, op: &PhysicalOperator) -> VisitorResult<()> {
        self.continue_stage(op)
    }

    fn visit_pipeline(&mut self, op: &PhysicalOperator) -> VisitorResult<()> {
        self.continue_stage(op)
    }

    fn visit_union(&mut self, op: &PhysicalOperator) -> VisitorResult<()> {
        let inputs = self.input_stages(op)?;
        if let [stage] = inputs.as_slice() {
            self.stages.assign(&op.key, *stage);
            return Ok(());
        }

        let parallelism = inputs
            .iter()
            .filter_map(|&id| self.stages.get(id).map(|s| s.parallelism))
            .max()
            .unwrap_or(self.config.default_parallelism);
        let merge = self.open(StageKind::Merge, parallelism, None);
        for input in inputs {
            self.stages.link(input, merge);
        }
        self.stages.assign(&op.key, merge);
        Ok(())
    }

    fn visit_hash_redistribution(&mut self, op: &PhysicalOperator) -> VisitorResult<()> {
        let inputs = self.input_stages(op)?;
        let parallelism = self.shuffle_parallelism(op);
        let shuffle = self.open(StageKind::Shuffle, parallelism, Some(&op.key));
        for input in inputs {
            self.stages.link(input, shuffle);
        }
        self.stages.assign(&op.key, shuffle);
        Ok(())
    }

    fn visit_sort(&mut self, op: &PhysicalOperator) -> VisitorResult<()> {
        let inputs = self.input_stages(op)?;
        let sample = if self.config.sample_total_order_sort {
            let sample = self.open(StageKind::Sample, 1, Some(&op.key));
            for &input in &inputs {
                self.stages.link(input, sample);
            }
            Some(sample)
        } else {
            None
        };

        let parallelism = self.shuffle_parallelism(op);
        let sort = self.open(StageKind::Shuffle, parallelism, Some(&op.key));
        if let Some(sample) = sample {
            self.stages.link(sample, sort);
        }
        for input in inputs {
            self.stages.link(input, sort);
        }
        self.stages.assign(&op.key, sort);
        debug!(stage = %sort, sort = %op.name(), sampled = sample.is_some(), "Planned total-order sort");
        Ok(())
    }
}
