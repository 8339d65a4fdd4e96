//! Core types for Drover.
//!
//! - [`OperatorKey`]: identity of an operator within a plan scope
//! - [`StageId`]: identity of an execution stage
//! - [`JobId`]: identity of a backend job bound to a stage

mod ids;

pub use ids::{JobId, KeyGenerator, OperatorKey, StageId};
