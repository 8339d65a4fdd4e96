//! Generic operator graph.
//!
//! An [`OperatorPlan`] is the container used for every plan in Drover: the
//! outer logical plan, each nested sub-plan owned by a structural operator,
//! and the physical plan handed to the stage compiler. Nodes are kept in
//! insertion order so every traversal is deterministic.
//!
//! Edges point in the direction data flows: `connect(a, b)` means "a feeds b".
//! Roots are operators with no input inside the plan; leaves have no consumer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use drover_common::OperatorKey;

use crate::error::{VisitorError, VisitorResult};

/// A node that can live in an [`OperatorPlan`].
pub trait PlanNode: fmt::Debug {
    /// Returns the operator's key.
    fn key(&self) -> &OperatorKey;

    /// Returns a short human-readable name, e.g. `Filter - scope-4`.
    fn name(&self) -> String;

    /// Returns the inputs the operator itself declares, if it tracks them.
    ///
    /// Multi-input operators (cogroup, join) name their inputs in order;
    /// [`OperatorPlan::validate`] checks these against the plan's edges.
    fn declared_inputs(&self) -> Option<&[OperatorKey]> {
        None
    }
}

/// An acyclic graph of operators.
pub struct OperatorPlan<O> {
    /// Nodes in insertion order.
    nodes: Vec<Arc<O>>,
    /// Key to position in `nodes`.
    index: HashMap<OperatorKey, usize>,
    /// Consumers of each node, in connection order.
    successors: HashMap<OperatorKey, Vec<OperatorKey>>,
    /// Producers of each node, in connection order.
    predecessors: HashMap<OperatorKey, Vec<OperatorKey>>,
}

impl<O> Default for OperatorPlan<O> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            successors: HashMap::new(),
            predecessors: HashMap::new(),
        }
    }
}

impl<O> Clone for OperatorPlan<O> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            index: self.index.clone(),
            successors: self.successors.clone(),
            predecessors: self.predecessors.clone(),
        }
    }
}

impl<O: PlanNode> fmt::Debug for OperatorPlan<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorPlan")
            .field("operators", &self.nodes.len())
            .field(
                "roots",
                &self.roots().iter().map(|op| op.key().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

const NO_KEYS: &[OperatorKey] = &[];

impl<O: PlanNode> OperatorPlan<O> {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operator and returns a shared handle to it.
    pub fn add(&mut self, op: O) -> VisitorResult<Arc<O>> {
        let key = op.key().clone();
        if self.index.contains_key(&key) {
            return Err(VisitorError::DuplicateOperator(key));
        }
        let op = Arc::new(op);
        self.index.insert(key, self.nodes.len());
        self.nodes.push(Arc::clone(&op));
        Ok(op)
    }

    /// Connects `from` to `to`: the output of `from` feeds `to`.
    pub fn connect(&mut self, from: &OperatorKey, to: &OperatorKey) -> VisitorResult<()> {
        for key in [from, to] {
            if !self.index.contains_key(key) {
                return Err(VisitorError::UnknownOperator(key.clone()));
            }
        }
        if from == to {
            return Err(VisitorError::SelfLoop(from.clone()));
        }

        let outs = self.successors.entry(from.clone()).or_default();
        if outs.contains(to) {
            return Err(VisitorError::DuplicateEdge {
                from: from.clone(),
                to: to.clone(),
            });
        }
        outs.push(to.clone());
        self.predecessors
            .entry(to.clone())
            .or_default()
            .push(from.clone());
        Ok(())
    }

    /// Adds `op` and connects every key in `inputs` to it.
    pub fn add_with_inputs(&mut self, op: O, inputs: &[OperatorKey]) -> VisitorResult<Arc<O>> {
        let op = self.add(op)?;
        for input in inputs {
            self.connect(input, op.key())?;
        }
        Ok(op)
    }

    /// Returns the operator with the given key.
    pub fn get(&self, key: &OperatorKey) -> Option<&Arc<O>> {
        self.index.get(key).map(|&i| &self.nodes[i])
    }

    /// Returns the operator with the given key or an unknown-operator error.
    pub fn require(&self, key: &OperatorKey) -> VisitorResult<&Arc<O>> {
        self.get(key)
            .ok_or_else(|| VisitorError::UnknownOperator(key.clone()))
    }

    /// Returns true if the plan contains the key.
    pub fn contains(&self, key: &OperatorKey) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of operators.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the plan has no operators.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over operators in insertion order.
    pub fn operators(&self) -> impl Iterator<Item = &Arc<O>> {
        self.nodes.iter()
    }

    /// Returns the producers feeding `key`.
    pub fn predecessors(&self, key: &OperatorKey) -> &[OperatorKey] {
        self.predecessors.get(key).map_or(NO_KEYS, Vec::as_slice)
    }

    /// Returns the consumers fed by `key`.
    pub fn successors(&self, key: &OperatorKey) -> &[OperatorKey] {
        self.successors.get(key).map_or(NO_KEYS, Vec::as_slice)
    }

    /// Returns operators with no input in this plan, in insertion order.
    pub fn roots(&self) -> Vec<Arc<O>> {
        self.nodes
            .iter()
            .filter(|op| self.predecessors(op.key()).is_empty())
            .cloned()
            .collect()
    }

    /// Returns operators with no consumer in this plan, in insertion order.
    pub fn leaves(&self) -> Vec<Arc<O>> {
        self.nodes
            .iter()
            .filter(|op| self.successors(op.key()).is_empty())
            .cloned()
            .collect()
    }

    /// Returns true if `key` has no input in this plan.
    pub fn is_root(&self, key: &OperatorKey) -> bool {
        self.contains(key) && self.predecessors(key).is_empty()
    }

    /// Checks the plan invariants: acyclic, and every declared input of an
    /// operator feeds it through an edge of this plan.
    pub fn validate(&self) -> VisitorResult<()> {
        for op in &self.nodes {
            if let Some(inputs) = op.declared_inputs() {
                let preds = self.predecessors(op.key());
                for input in inputs {
                    if !preds.contains(input) {
                        return Err(VisitorError::UnresolvedInput {
                            operator: op.key().clone(),
                            input: input.clone(),
                        });
                    }
                }
            }
        }
        self.dependency_order().map(|_| ())
    }

    /// Orders every operator after all of its producers.
    ///
    /// Starts from the leaves and emits each operator once all of its
    /// predecessors are emitted; reports the first cycle it meets.
    pub fn dependency_order(&self) -> VisitorResult<Vec<Arc<O>>> {
        self.ordered_from(&self.leaves(), |key| self.predecessors(key))
    }

    /// Orders every operator after all of its consumers.
    pub fn reverse_dependency_order(&self) -> VisitorResult<Vec<Arc<O>>> {
        self.ordered_from(&self.roots(), |key| self.successors(key))
    }

    fn ordered_from<'a>(
        &'a self,
        starts: &[Arc<O>],
        before: impl Fn(&OperatorKey) -> &'a [OperatorKey],
    ) -> VisitorResult<Vec<Arc<O>>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unseen,
            InProgress,
            Done,
        }

        let mut marks = vec![Mark::Unseen; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        // Explicit stack: (node index, next dependency to look at).
        for start in starts {
            let Some(&start) = self.index.get(start.key()) else {
                continue;
            };
            if marks[start] != Mark::Unseen {
                continue;
            }
            let mut stack = vec![(start, 0usize)];
            marks[start] = Mark::InProgress;

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let deps = before(self.nodes[node].key());
                if let Some(dep) = deps.get(top.1) {
                    top.1 += 1;
                    let dep = self.index[dep];
                    match marks[dep] {
                        Mark::Unseen => {
                            marks[dep] = Mark::InProgress;
                            stack.push((dep, 0));
                        }
                        Mark::InProgress => {
                            return Err(VisitorError::Cycle(self.nodes[dep].key().clone()));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    order.push(Arc::clone(&self.nodes[node]));
                    stack.pop();
                }
            }
        }

        if order.len() < self.nodes.len() {
            // Nodes on a cycle with no exit are never reached from a start.
            let stuck = marks
                .iter()
                .position(|m| *m != Mark::Done)
                .map_or_else(|| self.nodes[0].key().clone(), |i| self.nodes[i].key().clone());
            return Err(VisitorError::Cycle(stuck));
        }

        Ok(order)
    }
}
