//! Physical plan visitor.

use drover_plan::{PlanWalker, VisitorResult};

use super::operator::PhysicalOperator;

/// Operations over a physical plan, grouped by how an operator moves data.
///
/// Every operation defaults to a no-op. Physical plans own no sub-plans, so a
/// visitor holds a single walker. Drive a visitor through
/// [`PhysicalVisitor::visit`] or [`PhysicalOperator::accept`].
pub trait PhysicalVisitor {
    /// Returns the walker over the plan being visited.
    fn walker(&self) -> &dyn PlanWalker<PhysicalOperator>;

    /// Visits every operator in walker order.
    fn visit(&mut self) -> VisitorResult<()> {
        let sequence = self.walker().sequence()?;
        for op in &sequence {
            op.accept(self)?;
        }
        Ok(())
    }

    /// A source.
    fn visit_load(&mut self, _op: &PhysicalOperator) -> VisitorResult<()> {
        Ok(())
    }

    /// A sink.
    fn visit_store(&mut self, _op: &PhysicalOperator) -> VisitorResult<()> {
        Ok(())
    }

    /// A single-input operator that keeps tuples in their partition.
    fn visit_pipeline(&mut self, _op: &PhysicalOperator) -> VisitorResult<()> {
        Ok(())
    }

    /// A multi-input operator that keeps tuples in their partition.
    fn visit_union(&mut self, _op: &PhysicalOperator) -> VisitorResult<()> {
        Ok(())
    }

    /// An operator that repartitions by a hash of its key.
    fn visit_hash_redistribution(&mut self, _op: &PhysicalOperator) -> VisitorResult<()> {
        Ok(())
    }

    /// A total-order sort.
    fn visit_sort(&mut self, _op: &PhysicalOperator) -> VisitorResult<()> {
        Ok(())
    }
}
