//! Drover error types.
//!
//! Covers every failure the compile-and-launch pipeline can signal.

use std::fmt;
use thiserror::Error;

use crate::types::{JobId, OperatorKey};

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid configuration.
    InvalidConfig = 0x0002,
    /// Operation was cancelled.
    Cancelled = 0x0003,

    // I/O errors (0x0100 - 0x01FF)
    /// General I/O error.
    Io = 0x0100,

    // Plan errors (0x0200 - 0x02FF)
    /// Plan traversal failed.
    Traversal = 0x0200,
    /// Plan violates a structural invariant.
    PlanStructure = 0x0201,

    // Execution errors (0x0300 - 0x03FF)
    /// Expression or operator evaluation failed.
    Evaluation = 0x0300,
    /// Job execution failed.
    ExecutionFailed = 0x0301,

    // Job errors (0x0400 - 0x04FF)
    /// Binding or submitting the job graph failed.
    JobCreation = 0x0400,
    /// The driver reported a self-contradictory state.
    DriverInconsistency = 0x0401,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "I/O",
            0x02 => "Plan",
            0x03 => "Execution",
            0x04 => "Job",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for Drover.
///
/// Traversal and plan-structure errors abort compilation immediately.
/// Per-job failures are not errors: they are aggregated into statistics
/// and the launch reports `false`. Only a driver that contradicts itself
/// surfaces as [`DroverError::DriverInconsistency`].
///
/// # Example
///
/// ```rust
/// use drover_common::error::{DroverError, ErrorCode};
///
/// let err = DroverError::plan_structure("cycle through scope-4");
/// assert_eq!(err.code(), ErrorCode::PlanStructure);
/// assert_eq!(err.code().category(), "Plan");
/// ```
#[derive(Debug, Error)]
pub enum DroverError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// The launch was cancelled before the job graph finished.
    #[error("launch was cancelled")]
    Cancelled,

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    // ==========================================================================
    // Plan Errors
    // ==========================================================================
    /// A visitor aborted the traversal.
    #[error("traversal failed: {message}")]
    Traversal {
        /// Error message.
        message: String,
    },

    /// The plan violates an invariant (cycle, unresolved input).
    #[error("invalid plan structure: {message}")]
    PlanStructure {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Execution Errors
    // ==========================================================================
    /// An operator reported the error status while producing values.
    #[error("evaluation failed at {operator}: {message}")]
    Evaluation {
        /// The operator that failed.
        operator: OperatorKey,
        /// Error message.
        message: String,
    },

    /// Job execution failed outside the per-job failure path.
    #[error("execution failed: {message}")]
    Execution {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Job Errors
    // ==========================================================================
    /// The job graph could not be built or submitted.
    #[error("job creation failed: {message}")]
    JobCreation {
        /// Error message.
        message: String,
    },

    /// A job referenced by the driver does not exist.
    #[error("unknown job {job_id}")]
    UnknownJob {
        /// The missing job.
        job_id: JobId,
    },

    /// The driver reports an incomplete run with no failed jobs.
    #[error("driver inconsistency: {message}")]
    DriverInconsistency {
        /// Error message.
        message: String,
    },
}

impl DroverError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::Config { .. } => ErrorCode::InvalidConfig,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Io { .. } => ErrorCode::Io,
            Self::Traversal { .. } => ErrorCode::Traversal,
            Self::PlanStructure { .. } => ErrorCode::PlanStructure,
            Self::Evaluation { .. } => ErrorCode::Evaluation,
            Self::Execution { .. } => ErrorCode::ExecutionFailed,
            Self::JobCreation { .. } | Self::UnknownJob { .. } => ErrorCode::JobCreation,
            Self::DriverInconsistency { .. } => ErrorCode::DriverInconsistency,
        }
    }

    /// Returns true if this error must never be retried or downgraded.
    ///
    /// A self-contradictory driver means its bookkeeping cannot be trusted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::DriverInconsistency { .. } | Self::Internal { .. })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a traversal error.
    #[must_use]
    pub fn traversal(message: impl Into<String>) -> Self {
        Self::Traversal {
            message: message.into(),
        }
    }

    /// Creates a plan-structure error.
    #[must_use]
    pub fn plan_structure(message: impl Into<String>) -> Self {
        Self::PlanStructure {
            message: message.into(),
        }
    }

    /// Creates an execution error.
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Creates a job-creation error.
    #[must_use]
    pub fn job_creation(message: impl Into<String>) -> Self {
        Self::JobCreation {
            message: message.into(),
        }
    }

    /// Creates a driver-inconsistency error.
    #[must_use]
    pub fn driver_inconsistency(message: impl Into<String>) -> Self {
        Self::DriverInconsistency {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = DroverError::traversal("bad sub-plan");
        assert_eq!(err.code(), ErrorCode::Traversal);
        assert_eq!(err.code().category(), "Plan");

        let err = DroverError::driver_inconsistency("no failed jobs");
        assert_eq!(err.code().category(), "Job");
        assert_eq!(err.code().as_u16(), 0x0401);
    }

    #[test]
    fn test_error_display() {
        let err = DroverError::UnknownJob {
            job_id: JobId::new(7),
        };
        assert_eq!(err.to_string(), "unknown job job-7");

        let err = DroverError::Evaluation {
            operator: OperatorKey::new("test", 3),
            message: "column 4 out of range".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "evaluation failed at test-3: column 4 out of range"
        );
    }

    #[test]
    fn test_fatal() {
        assert!(DroverError::driver_inconsistency("x").is_fatal());
        assert!(!DroverError::Cancelled.is_fatal());
        assert!(!DroverError::job_creation("x").is_fatal());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DroverError = io_err.into();
        assert_eq!(err.code(), ErrorCode::Io);
    }
}
