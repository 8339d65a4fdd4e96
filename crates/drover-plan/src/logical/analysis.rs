//! Read-only analyses built on [`LogicalVisitor`].

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

use super::operator::{LogicalOperator, UserFunc};
use super::visitor::{walk_user_func, LogicalVisitor};
use super::LogicalPlan;
use crate::error::VisitorResult;
use crate::graph::PlanNode;
use crate::walker::{DependencyOrderWalker, WalkerStack};

/// Collects the names of user functions referenced anywhere in a plan,
/// nested sub-plans included.
#[derive(Debug)]
pub struct ReferencedFunctions {
    walkers: WalkerStack<LogicalOperator>,
    names: BTreeSet<String>,
}

impl ReferencedFunctions {
    /// Creates the analysis over `plan`.
    pub fn new(plan: Arc<LogicalPlan>) -> Self {
        Self {
            walkers: WalkerStack::new(Box::new(DependencyOrderWalker::new(plan))),
            names: BTreeSet::new(),
        }
    }

    /// Runs the analysis and returns the sorted function names.
    pub fn collect(mut self) -> VisitorResult<Vec<String>> {
        self.visit()?;
        Ok(self.names.into_iter().collect())
    }
}

impl LogicalVisitor for ReferencedFunctions {
    fn walkers(&mut self) -> &mut WalkerStack<LogicalOperator> {
        &mut self.walkers
    }

    fn visit_user_func(&mut self, func: &UserFunc) -> VisitorResult<()> {
        self.names.insert(func.name.clone());
        walk_user_func(self, func)
    }
}

/// Renders a plan as an indented tree.
///
/// Each operator is printed on its own line, indented by the nesting depth of
/// the sub-plan it belongs to. Operands appear after their consumer.
#[derive(Debug)]
pub struct PlanPrinter {
    walkers: WalkerStack<LogicalOperator>,
    out: String,
}

impl PlanPrinter {
    /// Creates a printer over `plan`.
    pub fn new(plan: Arc<LogicalPlan>) -> Self {
        Self {
            walkers: WalkerStack::new(Box::new(DependencyOrderWalker::new(plan))),
            out: String::new(),
        }
    }

    /// Renders the plan.
    pub fn print(mut self) -> VisitorResult<String> {
        self.visit()?;
        Ok(self.out)
    }
}

impl LogicalVisitor for PlanPrinter {
    fn walkers(&mut self) -> &mut WalkerStack<LogicalOperator> {
        &mut self.walkers
    }

    fn on_operator(&mut self, op: &LogicalOperator) -> VisitorResult<()> {
        let indent = (self.walkers.depth() - 1) * 2;
        let _ = writeln!(self.out, "{:indent$}{}", "", op.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use drover_common::KeyGenerator;

    use super::*;
    use crate::logical::operator::{Filter, Load, Project};

    #[test]
    fn test_referenced_functions_in_sub_plans() {
        let mut keys = KeyGenerator::new("a");
        let load = LogicalOperator::from(Load {
            key: keys.next_key(),
            location: "input".into(),
        })
        .shared();
        let column = LogicalOperator::from(Project {
            key: keys.next_key(),
            expression: Arc::clone(&load),
            columns: vec![0],
            sentinel: true,
        })
        .shared();

        let mut condition = LogicalPlan::new();
        condition
            .add(LogicalOperator::from(UserFunc {
                key: keys.next_key(),
                name: "IsValid".into(),
                args: vec![column],
            }))
            .unwrap();

        let mut plan = LogicalPlan::new();
        let load_key = load.key().clone();
        plan.add(LogicalOperator::clone(&load)).unwrap();
        let filter = plan
            .add_with_inputs(
                LogicalOperator::from(Filter {
                    key: keys.next_key(),
                    condition: Arc::new(condition),
                }),
                &[load_key],
            )
            .unwrap();

        let names = ReferencedFunctions::new(Arc::new(plan.clone())).collect().unwrap();
        assert_eq!(names, vec!["IsValid".to_string()]);

        let printed = PlanPrinter::new(Arc::new(plan)).print().unwrap();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines[0], "Load - a-1");
        assert_eq!(lines[1], filter.name());
        assert_eq!(lines[2], "  UserFunc - a-3");
        assert_eq!(lines[3], "  Project - a-2");
    }
}
