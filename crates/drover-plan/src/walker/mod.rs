//! Traversal strategies.
//!
//! A walker decides the order in which the operators of one plan are handed
//! to a visitor. Visitors hold their walkers in a [`WalkerStack`]: entering a
//! nested sub-plan pushes a walker scoped to that sub-plan and leaving it pops
//! the walker again, so the outer strategy is restored exactly.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use drover_common::OperatorKey;
use tracing::trace;

use crate::error::{VisitorError, VisitorResult};
use crate::graph::{OperatorPlan, PlanNode};

/// A traversal strategy over one plan.
pub trait PlanWalker<O: PlanNode>: fmt::Debug {
    /// Returns the plan this walker traverses.
    fn plan(&self) -> &Arc<OperatorPlan<O>>;

    /// Returns every operator of the plan in this walker's order.
    fn sequence(&self) -> VisitorResult<Vec<Arc<O>>>;

    /// Creates a walker of the same strategy over another plan.
    fn spawn(&self, plan: Arc<OperatorPlan<O>>) -> Box<dyn PlanWalker<O>>;

    /// Returns the strategy name.
    fn name(&self) -> &'static str;
}

/// Pre-order walk from the roots following successors; each operator once.
pub struct DepthFirstWalker<O> {
    plan: Arc<OperatorPlan<O>>,
}

/// Visits every operator after all of its predecessors.
pub struct DependencyOrderWalker<O> {
    plan: Arc<OperatorPlan<O>>,
}

/// Visits every operator after all of its successors.
pub struct ReverseDependencyOrderWalker<O> {
    plan: Arc<OperatorPlan<O>>,
}

macro_rules! walker_common {
    ($walker:ident, $label:literal) => {
        impl<O> $walker<O> {
            /// Creates a walker over `plan`.
            pub fn new(plan: Arc<OperatorPlan<O>>) -> Self {
                Self { plan }
            }
        }

        impl<O: PlanNode> fmt::Debug for $walker<O> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($walker))
                    .field("operators", &self.plan.len())
                    .finish()
            }
        }

        impl<O> $walker<O> {
            const NAME: &'static str = $label;
        }
    };
}

walker_common!(DepthFirstWalker, "depth-first");
walker_common!(DependencyOrderWalker, "dependency-order");
walker_common!(ReverseDependencyOrderWalker, "reverse-dependency-order");

impl<O: PlanNode + 'static> PlanWalker<O> for DepthFirstWalker<O> {
    fn plan(&self) -> &Arc<OperatorPlan<O>> {
        &self.plan
    }

    fn sequence(&self) -> VisitorResult<Vec<Arc<O>>> {
        // Successor chains may loop back; reject cycles before walking them.
        self.plan.dependency_order()?;

        let mut seen: HashSet<&OperatorKey> = HashSet::new();
        let mut order = Vec::with_capacity(self.plan.len());

        for root in self.plan.roots() {
            let mut stack = vec![root];
            while let Some(op) = stack.pop() {
                let Some(op) = self.plan.get(op.key()) else {
                    continue;
                };
                if !seen.insert(op.key()) {
                    continue;
                }
                order.push(Arc::clone(op));
                // Reverse so the first successor is visited first.
                for next in self.plan.successors(op.key()).iter().rev() {
                    stack.push(Arc::clone(self.plan.require(next)?));
                }
            }
        }

        Ok(order)
    }

    fn spawn(&self, plan: Arc<OperatorPlan<O>>) -> Box<dyn PlanWalker<O>> {
        Box::new(Self::new(plan))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

impl<O: PlanNode + 'static> PlanWalker<O> for DependencyOrderWalker<O> {
    fn plan(&self) -> &Arc<OperatorPlan<O>> {
        &self.plan
    }

    fn sequence(&self) -> VisitorResult<Vec<Arc<O>>> {
        self.plan.dependency_order()
    }

    fn spawn(&self, plan: Arc<OperatorPlan<O>>) -> Box<dyn PlanWalker<O>> {
        Box::new(Self::new(plan))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

impl<O: PlanNode + 'static> PlanWalker<O> for ReverseDependencyOrderWalker<O> {
    fn plan(&self) -> &Arc<OperatorPlan<O>> {
        &self.plan
    }

    fn sequence(&self) -> VisitorResult<Vec<Arc<O>>> {
        self.plan.reverse_dependency_order()
    }

    fn spawn(&self, plan: Arc<OperatorPlan<O>>) -> Box<dyn PlanWalker<O>> {
        Box::new(Self::new(plan))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

/// The stack of walkers owned by a visitor.
///
/// The bottom walker covers the outermost plan and can never be popped.
#[derive(Debug)]
pub struct WalkerStack<O: PlanNode> {
    walkers: Vec<Box<dyn PlanWalker<O>>>,
}

impl<O: PlanNode> WalkerStack<O> {
    /// Creates a stack whose base walker is `base`.
    pub fn new(base: Box<dyn PlanWalker<O>>) -> Self {
        Self {
            walkers: vec![base],
        }
    }

    /// Makes `walker` the current walker.
    pub fn push(&mut self, walker: Box<dyn PlanWalker<O>>) {
        trace!(
            walker = walker.name(),
            depth = self.walkers.len() + 1,
            "Entering sub-plan"
        );
        self.walkers.push(walker);
    }

    /// Removes the current walker and restores the one below it.
    pub fn pop(&mut self) -> VisitorResult<Box<dyn PlanWalker<O>>> {
        if self.walkers.len() <= 1 {
            return Err(VisitorError::WalkerStackUnderflow);
        }
        let walker = self
            .walkers
            .pop()
            .ok_or(VisitorError::WalkerStackUnderflow)?;
        trace!(
            walker = walker.name(),
            depth = self.walkers.len(),
            "Leaving sub-plan"
        );
        Ok(walker)
    }

    /// Returns the walker in effect.
    pub fn current(&self) -> &dyn PlanWalker<O> {
        // The base walker is never popped.
        self.walkers[self.walkers.len() - 1].as_ref()
    }

    /// Returns the number of walkers on the stack, base included.
    pub fn depth(&self) -> usize {
        self.walkers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Node(OperatorKey);

    impl PlanNode for Node {
        fn key(&self) -> &OperatorKey {
            &self.0
        }

        fn name(&self) -> String {
            format!("Node - {}", self.0)
        }
    }

    fn key(id: u64) -> OperatorKey {
        OperatorKey::new("w", id)
    }

    /// 1 -> 2 -> 4, 1 -> 3 -> 4
    fn plan() -> Arc<OperatorPlan<Node>> {
        let mut plan = OperatorPlan::new();
        for id in 1..=4 {
            plan.add(Node(key(id))).unwrap();
        }
        plan.connect(&key(1), &key(2)).unwrap();
        plan.connect(&key(1), &key(3)).unwrap();
        plan.connect(&key(2), &key(4)).unwrap();
        plan.connect(&key(3), &key(4)).unwrap();
        Arc::new(plan)
    }

    fn ids(walker: &dyn PlanWalker<Node>) -> Vec<u64> {
        walker
            .sequence()
            .unwrap()
            .iter()
            .map(|op| op.0.id)
            .collect()
    }

    #[test]
    fn test_debug_reports_plan_size() {
        let walker: Box<dyn PlanWalker<Node>> = Box::new(DepthFirstWalker::new(plan()));
        assert_eq!(format!("{walker:?}"), "DepthFirstWalker { operators: 4 }");
        assert_eq!(
            format!("{:?}", ReverseDependencyOrderWalker::new(plan())),
            "ReverseDependencyOrderWalker { operators: 4 }"
        );
    }

    #[test]
    fn test_orders() {
        let plan = plan();
        assert_eq!(ids(&DepthFirstWalker::new(Arc::clone(&plan))), vec![1, 2, 4, 3]);
        assert_eq!(
            ids(&DependencyOrderWalker::new(Arc::clone(&plan))),
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            ids(&ReverseDependencyOrderWalker::new(plan)),
            vec![4, 2, 3, 1]
        );
    }

    #[test]
    fn test_spawn_keeps_strategy() {
        let walker = DepthFirstWalker::new(plan());
        let mut other = OperatorPlan::new();
        other.add(Node(key(9))).unwrap();
        let spawned = walker.spawn(Arc::new(other));
        assert_eq!(spawned.name(), "depth-first");
        assert_eq!(ids(spawned.as_ref()), vec![9]);
    }

    #[test]
    fn test_stack_push_pop() {
        let mut stack = WalkerStack::new(Box::new(DepthFirstWalker::new(plan())));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.pop().unwrap_err(), VisitorError::WalkerStackUnderflow);

        stack.push(Box::new(DependencyOrderWalker::new(plan())));
        assert_eq!(stack.current().name(), "dependency-order");
        assert_eq!(stack.depth(), 2);

        stack.pop().unwrap();
        assert_eq!(stack.current().name(), "depth-first");
    }
}
