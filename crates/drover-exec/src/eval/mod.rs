//! Pull evaluation protocol.
//!
//! Operators produce values on demand: every call to `get_next` returns a
//! [`Next`], which is either a payload or one of three in-band signals.
//! End-of-data and null are expected outcomes, not failures; only
//! [`Next::Error`] reports a real problem.
//!
//! Composing operators follow one contract: look at an operand's status
//! before touching its payload, return the first non-OK result unchanged,
//! and stop pulling operands as soon as the outcome is decided.

mod expr;
mod relational;
mod spec;

use std::fmt;

use drover_common::{DroverError, OperatorKey};
use drover_plan::logical::DataType;
use thiserror::Error;

pub use expr::{
    AndExpr, BinCondExpr, BoxedExpr, CastExpr, CompareExpr, CompareOp, ConstantExpr,
    ExpressionOperator, IsNullExpr, NotExpr, OrExpr, ProjectExpr,
};
pub use relational::{
    collect_tuples, BoxedRelational, FilterTuples, ProjectTuples, RelationalOperator,
    TupleSource,
};
pub use spec::ExprSpec;

/// Result of one pull.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Next<T> {
    /// A value was produced.
    Ok(T),
    /// The operator has no more values.
    EndOfData,
    /// The value is null.
    Null,
    /// Evaluation failed.
    Error(EvalError),
}

/// The status part of a [`Next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// A value was produced.
    Ok,
    /// The input is exhausted.
    EndOfData,
    /// The result is null.
    Null,
    /// Evaluation failed.
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::EndOfData => write!(f, "EOP"),
            Status::Null => write!(f, "NULL"),
            Status::Error => write!(f, "ERR"),
        }
    }
}

impl<T> Next<T> {
    /// Returns the status of this result.
    pub fn status(&self) -> Status {
        match self {
            Next::Ok(_) => Status::Ok,
            Next::EndOfData => Status::EndOfData,
            Next::Null => Status::Null,
            Next::Error(_) => Status::Error,
        }
    }

    /// Returns true if a value was produced.
    pub fn is_ok(&self) -> bool {
        matches!(self, Next::Ok(_))
    }

    /// Returns the payload, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Next::Ok(v) => Some(v),
            _ => None,
        }
    }

    /// Maps the payload, keeping every other status unchanged.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Next<U> {
        match self {
            Next::Ok(v) => Next::Ok(f(v)),
            Next::EndOfData => Next::EndOfData,
            Next::Null => Next::Null,
            Next::Error(e) => Next::Error(e),
        }
    }

    /// Converts into a `Result`, with the in-band signals as `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, EvalError> {
        match self {
            Next::Ok(v) => Ok(Some(v)),
            Next::EndOfData | Next::Null => Ok(None),
            Next::Error(e) => Err(e),
        }
    }
}

impl<T> From<EvalError> for Next<T> {
    fn from(err: EvalError) -> Self {
        Next::Error(err)
    }
}

/// Payload of the error status.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// An operand produced a value of the wrong type.
    #[error("{operator}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The operator that rejected the value.
        operator: OperatorKey,
        /// The type the operator needs.
        expected: DataType,
        /// The type that was produced.
        found: DataType,
    },

    /// Two values cannot be compared.
    #[error("{operator}: cannot compare {lhs} with {rhs}")]
    Incomparable {
        /// The comparison operator.
        operator: OperatorKey,
        /// Left type.
        lhs: DataType,
        /// Right type.
        rhs: DataType,
    },

    /// A column reference is outside the input tuple.
    #[error("{operator}: column {column} out of range for tuple of width {width}")]
    ColumnOutOfRange {
        /// The projection.
        operator: OperatorKey,
        /// Referenced column.
        column: usize,
        /// Width of the input tuple.
        width: usize,
    },

    /// The operator was pulled again after it reported end-of-data.
    #[error("{operator}: pulled after end of data")]
    Exhausted {
        /// The exhausted operator.
        operator: OperatorKey,
    },

    /// Any other failure raised by an operator.
    #[error("{operator}: {message}")]
    Failed {
        /// The failing operator.
        operator: OperatorKey,
        /// Description of the failure.
        message: String,
    },
}

impl EvalError {
    /// Creates a generic failure for `operator`.
    pub fn failed(operator: &OperatorKey, message: impl Into<String>) -> Self {
        Self::Failed {
            operator: operator.clone(),
            message: message.into(),
        }
    }

    /// Returns the operator that raised the error.
    pub fn operator(&self) -> &OperatorKey {
        match self {
            Self::TypeMismatch { operator, .. }
            | Self::Incomparable { operator, .. }
            | Self::ColumnOutOfRange { operator, .. }
            | Self::Exhausted { operator }
            | Self::Failed { operator, .. } => operator,
        }
    }
}

impl From<EvalError> for DroverError {
    fn from(err: EvalError) -> Self {
        DroverError::Evaluation {
            operator: err.operator().clone(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use drover_common::ErrorCode;

    use super::*;

    #[test]
    fn test_next_status() {
        assert_eq!(Next::Ok(1).status(), Status::Ok);
        assert_eq!(Next::<i32>::Null.status(), Status::Null);
        assert_eq!(Next::<i32>::EndOfData.status().to_string(), "EOP");
        assert_eq!(Next::Ok(2).map(|v| v * 2), Next::Ok(4));
        assert_eq!(Next::<i32>::Null.map(|v| v * 2), Next::Null);
    }

    #[test]
    fn test_into_result() {
        let key = OperatorKey::new("e", 1);
        assert_eq!(Next::Ok(3).into_result(), Ok(Some(3)));
        assert_eq!(Next::<i32>::EndOfData.into_result(), Ok(None));
        let err = EvalError::failed(&key, "boom");
        assert_eq!(Next::<i32>::from(err.clone()).into_result(), Err(err));
    }

    #[test]
    fn test_error_conversion() {
        let key = OperatorKey::new("e", 7);
        let err = DroverError::from(EvalError::Exhausted { operator: key });
        assert_eq!(err.code(), ErrorCode::Evaluation);
        assert!(err.to_string().contains("e-7"));
    }
}
