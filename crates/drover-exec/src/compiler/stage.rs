//! Stages and the stage DAG.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use drover_common::{OperatorKey, StageId};
use drover_plan::PlanNode;
use serde::{Deserialize, Serialize};

use super::error::{CompileError, CompileResult};
use crate::physical::PhysicalPlan;

/// Why a stage exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Opened at a load.
    Source,
    /// Opened at a redistribution boundary.
    Shuffle,
    /// Samples the input of a total-order sort to pick partition bounds.
    Sample,
    /// Combines inputs computed in different stages without repartitioning.
    Merge,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Source => write!(f, "source"),
            StageKind::Shuffle => write!(f, "shuffle"),
            StageKind::Sample => write!(f, "sample"),
            StageKind::Merge => write!(f, "merge"),
        }
    }
}

/// A maximal run of operators executed without repartitioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Stage identity; also its position in the stage table.
    pub id: StageId,
    /// Why the stage exists.
    pub kind: StageKind,
    /// Operators executed by the stage, in dependency order.
    pub operators: Vec<OperatorKey>,
    /// The redistribution operator that opened the stage.
    pub boundary: Option<OperatorKey>,
    /// Number of parallel tasks.
    pub parallelism: usize,
}

impl Stage {
    fn new(id: StageId, kind: StageKind, parallelism: usize, boundary: Option<OperatorKey>) -> Self {
        Self {
            id,
            kind,
            operators: Vec::new(),
            boundary,
            parallelism,
        }
    }

    /// Returns true if the stage executes `key`.
    pub fn contains(&self, key: &OperatorKey) -> bool {
        self.operators.contains(key)
    }
}

/// The stage DAG of a physical plan.
///
/// An edge `a -> b` means `b` reads the published output of `a`, so `b` may
/// only start after `a` completed.
#[derive(Debug, Clone)]
pub struct StagePlan {
    plan: Arc<PhysicalPlan>,
    stages: Vec<Stage>,
    predecessors: Vec<Vec<StageId>>,
    successors: Vec<Vec<StageId>>,
    assignment: HashMap<OperatorKey, StageId>,
}

impl StagePlan {
    pub(super) fn new(plan: Arc<PhysicalPlan>) -> Self {
        Self {
            plan,
            stages: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            assignment: HashMap::new(),
        }
    }

    pub(super) fn open(
        &mut self,
        kind: StageKind,
        parallelism: usize,
        boundary: Option<OperatorKey>,
    ) -> StageId {
        // Stage counts stay far below u32::MAX; ids are dense table positions.
        let id = StageId::new(self.stages.len() as u32);
        self.stages.push(Stage::new(id, kind, parallelism, boundary));
        self.predecessors.push(Vec::new());
        self.successors.push(Vec::new());
        id
    }

    pub(super) fn assign(&mut self, key: &OperatorKey, stage: StageId) {
        self.stages[stage.index()].operators.push(key.clone());
        self.assignment.insert(key.clone(), stage);
    }

    pub(super) fn link(&mut self, from: StageId, to: StageId) {
        if from == to || self.successors[from.index()].contains(&to) {
            return;
        }
        self.successors[from.index()].push(to);
        self.predecessors[to.index()].push(from);
    }

    /// Returns the compiled physical plan.
    pub fn physical_plan(&self) -> &Arc<PhysicalPlan> {
        &self.plan
    }

    /// Returns the number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if there are no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the stages, ordered by id.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Looks up a stage.
    pub fn get(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(id.index())
    }

    /// Returns the stage executing `key`.
    pub fn stage_of(&self, key: &OperatorKey) -> Option<StageId> {
        self.assignment.get(key).copied()
    }

    /// Returns the stages `id` depends on.
    pub fn predecessors(&self, id: StageId) -> &[StageId] {
        self.predecessors.get(id.index()).map_or(&[], Vec::as_slice)
    }

    /// Returns the stages depending on `id`.
    pub fn successors(&self, id: StageId) -> &[StageId] {
        self.successors.get(id.index()).map_or(&[], Vec::as_slice)
    }

    /// Returns the stages with no dependencies.
    pub fn roots(&self) -> Vec<StageId> {
        self.stages
            .iter()
            .map(|s| s.id)
            .filter(|&id| self.predecessors(id).is_empty())
            .collect()
    }

    /// Returns the stages nothing depends on.
    pub fn leaves(&self) -> Vec<StageId> {
        self.stages
            .iter()
            .map(|s| s.id)
            .filter(|&id| self.successors(id).is_empty())
            .collect()
    }

    /// Returns every edge as `(from, to)`.
    pub fn edges(&self) -> Vec<(StageId, StageId)> {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, tos)| tos.iter().map(move |&to| (self.stages[from].id, to)))
            .collect()
    }

    /// Orders the stages so every stage follows its dependencies.
    pub fn topological_order(&self) -> CompileResult<Vec<StageId>> {
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(Vec::len).collect();
        let mut ready: VecDeque<StageId> = self.roots().into();
        let mut order = Vec::with_capacity(self.stages.len());

        while let Some(id) = ready.pop_front() {
            order.push(id);
            for &next in self.successors(id) {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    ready.push_back(next);
                }
            }
        }

        if order.len() < self.stages.len() {
            let stuck = in_degree
                .iter()
                .position(|&d| d > 0)
                .map_or(StageId::new(0), |i| self.stages[i].id);
            return Err(CompileError::Cycle(stuck));
        }
        Ok(order)
    }

    /// Checks that every operator belongs to a stage and the stages form a DAG.
    pub fn validate(&self) -> CompileResult<()> {
        if let Some(op) = self.plan.operators().find(|op| !self.assignment.contains_key(op.key())) {
            return Err(CompileError::MissingStage(op.key().clone()));
        }
        self.topological_order().map(|_| ())
    }

    /// Renders the stages in topological order.
    ///
    /// ```text
    /// stage-0 [source, parallelism 1]
    ///   Load[bag] - p-1 (input)
    /// stage-1 [shuffle, parallelism 4] <- stage-0
    ///   Group[bag] - p-2 ([0])
    /// ```
    pub fn explain(&self) -> String {
        let order = self
            .topological_order()
            .unwrap_or_else(|_| self.stages.iter().map(|s| s.id).collect());

        let mut output = String::new();
        for id in order {
            let stage = &self.stages[id.index()];
            output.push_str(&format!(
                "{} [{}, parallelism {}]",
                stage.id, stage.kind, stage.parallelism
            ));
            let inputs = self.predecessors(id);
            if !inputs.is_empty() {
                let inputs: Vec<String> = inputs.iter().map(ToString::to_string).collect();
                output.push_str(&format!(" <- {}", inputs.join(", ")));
            }
            output.push('\n');

            if stage.kind == StageKind::Sample {
                if let Some(boundary) = &stage.boundary {
                    output.push_str(&format!("  quantiles for {boundary}\n"));
                }
            }
            for key in &stage.operators {
                let line = self
                    .plan
                    .get(key)
                    .map_or_else(|| key.to_string(), |op| op.describe());
                output.push_str("  ");
                output.push_str(&line);
                output.push('\n');
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: u64) -> OperatorKey {
        OperatorKey::new("s", id)
    }

    #[test]
    fn test_topological_order() {
        let mut stages = StagePlan::new(Arc::new(PhysicalPlan::new()));
        let a = stages.open(StageKind::Source, 1, None);
        let b = stages.open(StageKind::Source, 1, None);
        let c = stages.open(StageKind::Shuffle, 2, Some(key(3)));
        stages.link(b, c);
        stages.link(a, c);
        stages.link(a, c);

        assert_eq!(stages.edges(), vec![(a, c), (b, c)]);
        assert_eq!(stages.roots(), vec![a, b]);
        assert_eq!(stages.leaves(), vec![c]);
        assert_eq!(stages.topological_order().unwrap(), vec![a, b, c]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut stages = StagePlan::new(Arc::new(PhysicalPlan::new()));
        let a = stages.open(StageKind::Source, 1, None);
        let b = stages.open(StageKind::Shuffle, 1, None);
        let c = stages.open(StageKind::Shuffle, 1, None);
        stages.link(a, b);
        stages.link(b, c);
        stages.link(c, b);
        assert!(matches!(stages.topological_order(), Err(CompileError::Cycle(id)) if id == b));
    }
}
