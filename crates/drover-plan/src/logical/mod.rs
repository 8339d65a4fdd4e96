//! Logical plan model.
//!
//! A [`LogicalPlan`] holds relational operators; structural operators carry
//! nested logical plans of their own (conditions, grouping keys, projection
//! lists), nested to any depth.

mod analysis;
mod operator;
mod visitor;

pub use analysis::{PlanPrinter, ReferencedFunctions};
pub use operator::{
    BinCond, Binary, BinaryOp, Cast, Cogroup, Const, DataType, Filter, ForEach, Generate,
    Literal, Load, LogicalOperator, Project, Regexp, Sort, Split, Store, Unary, UnaryOp,
    UserFunc,
};
pub use visitor::{
    walk_bin_cond, walk_binary, walk_cast, walk_cogroup, walk_current, walk_filter,
    walk_for_each, walk_generate, walk_project, walk_regexp, walk_sort, walk_split,
    walk_sub_plan, walk_unary, walk_user_func, LogicalVisitor,
};

use crate::graph::OperatorPlan;

/// A plan of logical operators.
pub type LogicalPlan = OperatorPlan<LogicalOperator>;
