//! Stage compilation.
//!
//! The stage compiler splits a physical plan into a DAG of stages. A stage is
//! a maximal run of operators that execute without repartitioning tuples; a
//! redistribution operator (grouping, cogrouping, join, distinct, total-order
//! sort) ends the stages feeding it and opens a new one. Multi-input boundaries
//! are convergence points: every input branch becomes its own upstream stage
//! with an edge into the stage performing the combine.
//!
//! | Operator | Stage placement |
//! |----------|-----------------|
//! | Load | opens a source stage |
//! | Filter, ForEach, Limit, Split, Store | joins its input's stage |
//! | Union | joins its inputs' stage, or opens a merge stage |
//! | Group, Cogroup, Join, Distinct | opens a shuffle stage |
//! | Sort | opens a shuffle stage, preceded by a sample stage |

mod error;
mod partition;
mod stage;

pub use error::{CompileError, CompileResult};
pub use partition::StageCompiler;
pub use stage::{Stage, StageKind, StagePlan};
