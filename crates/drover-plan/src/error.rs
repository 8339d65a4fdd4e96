//! Traversal and plan-structure errors.

use drover_common::{DroverError, OperatorKey};
use thiserror::Error;

/// Errors raised while building, validating or traversing a plan.
///
/// Any of these aborts the traversal that raised it; nothing is swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisitorError {
    /// An operator with this key is already in the plan.
    #[error("operator {0} already exists in the plan")]
    DuplicateOperator(OperatorKey),

    /// An edge or lookup named an operator that is not in the plan.
    #[error("operator {0} is not in the plan")]
    UnknownOperator(OperatorKey),

    /// An edge would connect an operator to itself.
    #[error("operator {0} cannot feed itself")]
    SelfLoop(OperatorKey),

    /// The edge already exists.
    #[error("edge {from} -> {to} already exists")]
    DuplicateEdge {
        /// Producer.
        from: OperatorKey,
        /// Consumer.
        to: OperatorKey,
    },

    /// The plan contains a cycle through this operator.
    #[error("plan contains a cycle through {0}")]
    Cycle(OperatorKey),

    /// An operator declares an input that does not feed it in the plan.
    #[error("operator {operator} has unresolved input {input}")]
    UnresolvedInput {
        /// The consuming operator.
        operator: OperatorKey,
        /// The declared input.
        input: OperatorKey,
    },

    /// The walker stack would lose its outermost walker.
    #[error("walker stack underflow")]
    WalkerStackUnderflow,

    /// A visitor aborted the traversal.
    #[error("visitor failed at {operator}: {message}")]
    Aborted {
        /// The operator being visited.
        operator: OperatorKey,
        /// Reason given by the visitor.
        message: String,
    },
}

impl VisitorError {
    /// Creates a visitor abort for `operator`.
    pub fn aborted(operator: &OperatorKey, message: impl Into<String>) -> Self {
        Self::Aborted {
            operator: operator.clone(),
            message: message.into(),
        }
    }

    /// Returns true if the error describes a malformed plan rather than a
    /// failure inside a visitor.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Aborted { .. } | Self::WalkerStackUnderflow)
    }
}

/// Result type for plan operations.
pub type VisitorResult<T> = Result<T, VisitorError>;

impl From<VisitorError> for DroverError {
    fn from(err: VisitorError) -> Self {
        if err.is_structural() {
            DroverError::plan_structure(err.to_string())
        } else {
            DroverError::traversal(err.to_string())
        }
    }
}
