//! # drover-plan
//!
//! Operator plans and their traversal for Drover.
//!
//! This crate implements:
//! - A generic operator graph shared by logical plans, nested sub-plans and
//!   physical plans
//! - Exchangeable traversal strategies (walkers) and the walker stack
//! - The logical operator model, whose structural operators own nested sub-plans
//! - The logical visitor with per-operator default traversal

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;

/// Generic operator graph
pub mod graph;

/// Traversal strategies
pub mod walker;

/// Logical plan model and visitor
pub mod logical;

pub use error::{VisitorError, VisitorResult};
pub use graph::{OperatorPlan, PlanNode};
pub use walker::{
    DependencyOrderWalker, DepthFirstWalker, PlanWalker, ReverseDependencyOrderWalker,
    WalkerStack,
};
