//! Logical plan visitor.
//!
//! A [`LogicalVisitor`] has one operation per operator variant. The default
//! for leaves (load, store, const) does nothing; every other default recurses
//! into the operator's operands or sub-plans through the matching `walk_*`
//! function, so an override can do its own work and still call `walk_*` to
//! keep descending.
//!
//! Visitors are driven through [`LogicalOperator::accept`] or
//! [`LogicalVisitor::visit`], never by calling a `visit_*` operation
//! directly: dispatch is what runs the [`LogicalVisitor::on_operator`] hook
//! and keeps nested traversal consistent.
//!
//! Sub-plans are entered by pushing a walker spawned for the sub-plan onto
//! the visitor's [`WalkerStack`]; the roots of the sub-plan are visited in
//! that walker's order and the walker is popped on every exit path, errors
//! included.

use std::sync::Arc;

use tracing::trace;

use super::operator::{
    BinCond, Binary, Cast, Cogroup, Const, Filter, ForEach, Generate, Load, LogicalOperator,
    Project, Regexp, Sort, Split, Store, Unary, UserFunc,
};
use super::LogicalPlan;
use crate::error::VisitorResult;
use crate::walker::{DependencyOrderWalker, PlanWalker, WalkerStack};

/// Per-variant operations over a logical plan.
pub trait LogicalVisitor {
    /// Returns the visitor's walker stack.
    fn walkers(&mut self) -> &mut WalkerStack<LogicalOperator>;

    /// Returns the walker used for a nested sub-plan.
    fn sub_plan_walker(&self, plan: Arc<LogicalPlan>) -> Box<dyn PlanWalker<LogicalOperator>> {
        Box::new(DependencyOrderWalker::new(plan))
    }

    /// Visits the outer plan with the base walker.
    fn visit(&mut self) -> VisitorResult<()> {
        walk_current(self)
    }

    /// Called by dispatch for every operator, before its variant operation.
    fn on_operator(&mut self, _op: &LogicalOperator) -> VisitorResult<()> {
        Ok(())
    }

    fn visit_load(&mut self, _load: &Load) -> VisitorResult<()> {
        Ok(())
    }

    fn visit_store(&mut self, _store: &Store) -> VisitorResult<()> {
        Ok(())
    }

    fn visit_const(&mut self, _constant: &Const) -> VisitorResult<()> {
        Ok(())
    }

    fn visit_binary(&mut self, binary: &Binary) -> VisitorResult<()> {
        walk_binary(self, binary)
    }

    fn visit_unary(&mut self, unary: &Unary) -> VisitorResult<()> {
        walk_unary(self, unary)
    }

    fn visit_cogroup(&mut self, cogroup: &Cogroup) -> VisitorResult<()> {
        walk_cogroup(self, cogroup)
    }

    fn visit_generate(&mut self, generate: &Generate) -> VisitorResult<()> {
        walk_generate(self, generate)
    }

    fn visit_sort(&mut self, sort: &Sort) -> VisitorResult<()> {
        walk_sort(self, sort)
    }

    fn visit_filter(&mut self, filter: &Filter) -> VisitorResult<()> {
        walk_filter(self, filter)
    }

    fn visit_split(&mut self, split: &Split) -> VisitorResult<()> {
        walk_split(self, split)
    }

    fn visit_for_each(&mut self, for_each: &ForEach) -> VisitorResult<()> {
        walk_for_each(self, for_each)
    }

    fn visit_user_func(&mut self, func: &UserFunc) -> VisitorResult<()> {
        walk_user_func(self, func)
    }

    fn visit_bin_cond(&mut self, bin_cond: &BinCond) -> VisitorResult<()> {
        walk_bin_cond(self, bin_cond)
    }

    fn visit_cast(&mut self, cast: &Cast) -> VisitorResult<()> {
        walk_cast(self, cast)
    }

    fn visit_regexp(&mut self, regexp: &Regexp) -> VisitorResult<()> {
        walk_regexp(self, regexp)
    }

    fn visit_project(&mut self, project: &Project) -> VisitorResult<()> {
        walk_project(self, project)
    }
}

pub(crate) fn dispatch<V: LogicalVisitor + ?Sized>(
    op: &LogicalOperator,
    v: &mut V,
) -> VisitorResult<()> {
    v.on_operator(op)?;
    match op {
        LogicalOperator::Load(load) => v.visit_load(load),
        LogicalOperator::Store(store) => v.visit_store(store),
        LogicalOperator::Const(c) => v.visit_const(c),
        LogicalOperator::Binary(b) => v.visit_binary(b),
        LogicalOperator::Unary(u) => v.visit_unary(u),
        LogicalOperator::Cogroup(cg) => v.visit_cogroup(cg),
        LogicalOperator::Generate(g) => v.visit_generate(g),
        LogicalOperator::Sort(s) => v.visit_sort(s),
        LogicalOperator::Filter(f) => v.visit_filter(f),
        LogicalOperator::Split(s) => v.visit_split(s),
        LogicalOperator::ForEach(fe) => v.visit_for_each(fe),
        LogicalOperator::UserFunc(func) => v.visit_user_func(func),
        LogicalOperator::BinCond(bc) => v.visit_bin_cond(bc),
        LogicalOperator::Cast(c) => v.visit_cast(c),
        LogicalOperator::Regexp(r) => v.visit_regexp(r),
        LogicalOperator::Project(p) => v.visit_project(p),
    }
}

/// Visits every operator of the current walker's plan in walker order.
pub fn walk_current<V: LogicalVisitor + ?Sized>(v: &mut V) -> VisitorResult<()> {
    let sequence = v.walkers().current().sequence()?;
    for op in &sequence {
        op.accept(v)?;
    }
    Ok(())
}

/// Enters `plan` with a fresh walker, visits its roots in the walker's
/// order, and restores the outer walker.
pub fn walk_sub_plan<V: LogicalVisitor + ?Sized>(
    v: &mut V,
    plan: &Arc<LogicalPlan>,
) -> VisitorResult<()> {
    let walker = v.sub_plan_walker(Arc::clone(plan));
    v.walkers().push(walker);
    let result = visit_roots(v, plan);
    let popped = v.walkers().pop();
    result.and(popped.map(|_| ()))
}

fn visit_roots<V: LogicalVisitor + ?Sized>(
    v: &mut V,
    plan: &LogicalPlan,
) -> VisitorResult<()> {
    let sequence = v.walkers().current().sequence()?;
    for op in sequence.iter().filter(|op| plan.is_root(op.key())) {
        op.accept(v)?;
    }
    Ok(())
}

/// Left operand, then right operand.
pub fn walk_binary<V: LogicalVisitor + ?Sized>(v: &mut V, binary: &Binary) -> VisitorResult<()> {
    binary.lhs.accept(v)?;
    binary.rhs.accept(v)
}

/// The operand.
pub fn walk_unary<V: LogicalVisitor + ?Sized>(v: &mut V, unary: &Unary) -> VisitorResult<()> {
    unary.operand.accept(v)
}

/// For each input in order, each present group-by sub-plan in order.
pub fn walk_cogroup<V: LogicalVisitor + ?Sized>(
    v: &mut V,
    cogroup: &Cogroup,
) -> VisitorResult<()> {
    for input in &cogroup.inputs {
        for plan in cogroup.group_by_plans(input).iter().flatten() {
            trace!(cogroup = %cogroup.key, %input, "Walking group-by plan");
            walk_sub_plan(v, plan)?;
        }
    }
    Ok(())
}

/// Each output column sub-plan in order.
pub fn walk_generate<V: LogicalVisitor + ?Sized>(
    v: &mut V,
    generate: &Generate,
) -> VisitorResult<()> {
    for plan in &generate.plans {
        walk_sub_plan(v, plan)?;
    }
    Ok(())
}

/// Each sort key sub-plan in order.
pub fn walk_sort<V: LogicalVisitor + ?Sized>(v: &mut V, sort: &Sort) -> VisitorResult<()> {
    for plan in &sort.sort_plans {
        walk_sub_plan(v, plan)?;
    }
    Ok(())
}

/// The condition sub-plan.
pub fn walk_filter<V: LogicalVisitor + ?Sized>(v: &mut V, filter: &Filter) -> VisitorResult<()> {
    walk_sub_plan(v, &filter.condition)
}

/// Each present branch condition in order.
pub fn walk_split<V: LogicalVisitor + ?Sized>(v: &mut V, split: &Split) -> VisitorResult<()> {
    for plan in split.conditions.iter().flatten() {
        walk_sub_plan(v, plan)?;
    }
    Ok(())
}

/// The nested plan.
pub fn walk_for_each<V: LogicalVisitor + ?Sized>(
    v: &mut V,
    for_each: &ForEach,
) -> VisitorResult<()> {
    walk_sub_plan(v, &for_each.plan)
}

/// Arguments in declared order.
pub fn walk_user_func<V: LogicalVisitor + ?Sized>(
    v: &mut V,
    func: &UserFunc,
) -> VisitorResult<()> {
    for arg in &func.args {
        arg.accept(v)?;
    }
    Ok(())
}

/// Condition, then the true branch, then the false branch.
pub fn walk_bin_cond<V: LogicalVisitor + ?Sized>(
    v: &mut V,
    bin_cond: &BinCond,
) -> VisitorResult<()> {
    bin_cond.cond.accept(v)?;
    bin_cond.lhs.accept(v)?;
    bin_cond.rhs.accept(v)
}

/// The converted expression.
pub fn walk_cast<V: LogicalVisitor + ?Sized>(v: &mut V, cast: &Cast) -> VisitorResult<()> {
    cast.expression.accept(v)
}

/// The matched operand.
pub fn walk_regexp<V: LogicalVisitor + ?Sized>(v: &mut V, regexp: &Regexp) -> VisitorResult<()> {
    regexp.operand.accept(v)
}

/// Descends into the referenced expression unless the sentinel is set.
pub fn walk_project<V: LogicalVisitor + ?Sized>(
    v: &mut V,
    project: &Project,
) -> VisitorResult<()> {
    if project.sentinel {
        return Ok(());
    }
    project.expression.accept(v)
}
