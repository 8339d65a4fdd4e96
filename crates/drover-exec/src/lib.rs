//! # drover-exec
//!
//! Execution-side model for Drover.
//!
//! This crate implements:
//! - Runtime values and tuples
//! - The pull evaluation protocol with in-band status, and the expression and
//!   relational operators built on it
//! - The physical operator plan and its JSON description
//! - The stage compiler, which partitions a physical plan into a DAG of stages
//!   at data-redistribution boundaries

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Runtime values
pub mod value;

/// Pull evaluation protocol
pub mod eval;

/// Physical plan model
pub mod physical;

/// Stage compilation
pub mod compiler;

pub use compiler::{CompileError, Stage, StageCompiler, StageKind, StagePlan};
pub use eval::{EvalError, ExprSpec, ExpressionOperator, Next, RelationalOperator, Status};
pub use physical::{PhysicalKind, PhysicalOperator, PhysicalPlan, PlanSpec, Redistribution};
pub use value::{Tuple, Value};
