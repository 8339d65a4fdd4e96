//! Stage compilation errors.

use drover_common::{DroverError, OperatorKey, StageId};
use drover_plan::VisitorError;
use thiserror::Error;

/// Errors raised while splitting a physical plan into stages.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The physical plan is malformed or could not be walked.
    #[error(transparent)]
    Plan(#[from] VisitorError),

    /// An operator has the wrong number of inputs.
    #[error("{operator} takes {expected} inputs, found {found}")]
    Arity {
        /// The operator.
        operator: OperatorKey,
        /// Accepted number of inputs.
        expected: String,
        /// Declared number of inputs.
        found: usize,
    },

    /// A redistribution operator asks for zero parallel instances.
    #[error("{0} requests a parallelism of 0")]
    ZeroParallelism(OperatorKey),

    /// No stage was assigned to an operator's input.
    #[error("no stage produces the input of {0}")]
    MissingStage(OperatorKey),

    /// The stage graph is not acyclic.
    #[error("stage graph has a cycle through {0}")]
    Cycle(StageId),

    /// There is nothing to compile.
    #[error("physical plan has no operators")]
    EmptyPlan,
}

/// Result type for stage compilation.
pub type CompileResult<T> = Result<T, CompileError>;

impl From<CompileError> for DroverError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Plan(err) => err.into(),
            CompileError::MissingStage(_) => DroverError::internal(err.to_string()),
            CompileError::Arity { .. }
            | CompileError::ZeroParallelism(_)
            | CompileError::Cycle(_)
            | CompileError::EmptyPlan => DroverError::plan_structure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use drover_common::ErrorCode;

    use super::*;

    #[test]
    fn test_error_mapping() {
        let err: DroverError = CompileError::Plan(VisitorError::Cycle(OperatorKey::new("p", 2))).into();
        assert_eq!(err.code(), ErrorCode::PlanStructure);

        let err: DroverError = CompileError::MissingStage(OperatorKey::new("p", 2)).into();
        assert_eq!(err.code(), ErrorCode::Internal);

        let err = CompileError::Arity {
            operator: OperatorKey::new("p", 3),
            expected: "1".into(),
            found: 2,
        };
        assert_eq!(err.to_string(), "p-3 takes 1 inputs, found 2");

        let err: DroverError = CompileError::ZeroParallelism(OperatorKey::new("p", 4)).into();
        assert_eq!(err.code(), ErrorCode::PlanStructure);
    }
}
