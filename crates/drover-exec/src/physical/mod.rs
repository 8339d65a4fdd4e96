//! Physical plan model.
//!
//! A [`PhysicalPlan`] is the input of the stage compiler. Plans are built in
//! code with [`PhysicalPlanBuilder`] or loaded from JSON through [`PlanSpec`].

mod builder;
mod operator;
mod spec;
mod visitor;

pub use builder::PhysicalPlanBuilder;
pub use operator::{PhysicalKind, PhysicalOperator, Redistribution};
pub use spec::{OperatorSpec, PlanSpec};
pub use visitor::PhysicalVisitor;

use drover_plan::OperatorPlan;

/// A plan of physical operators.
pub type PhysicalPlan = OperatorPlan<PhysicalOperator>;
