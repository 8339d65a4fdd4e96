//! Execution engines and job drivers.
//!
//! An [`ExecutionEngine`] accepts a job graph and hands back a [`JobControl`],
//! the driver executing that graph in the background. The supervisor only
//! reads driver state; the driver alone changes job status.
//!
//! [`LocalEngine`] runs jobs in-process on the tokio runtime through a
//! pluggable [`JobRunner`].

mod local;
mod runner;

pub use local::{LocalControl, LocalEngine};
pub use runner::{JobContext, JobRunner, RunnerFuture, SimulatedRunner};

use std::fmt;

use drover_common::{DroverConfig, DroverResult, JobId};

use crate::job::{JobGraph, JobStats, JobStatus};

/// A backend able to execute job graphs.
pub trait ExecutionEngine: fmt::Debug + Send + Sync {
    /// Returns the engine configuration.
    fn config(&self) -> &DroverConfig;

    /// Starts executing `graph` asynchronously and returns its driver.
    ///
    /// Fails with a job-creation error if the graph cannot be submitted.
    fn submit(&self, graph: &JobGraph) -> DroverResult<Box<dyn JobControl>>;
}

/// Driver of one submitted job graph.
pub trait JobControl: fmt::Debug + Send + Sync {
    /// Returns true once every job is terminal.
    fn all_finished(&self) -> bool;

    /// Returns the status of a job.
    fn status(&self, job: JobId) -> DroverResult<JobStatus>;

    /// Returns the completed fraction of a job, in `[0, 1]`.
    fn progress(&self, job: JobId) -> DroverResult<f64>;

    /// Returns the jobs that succeeded.
    fn succeeded_jobs(&self) -> Vec<JobId>;

    /// Returns the jobs that failed.
    fn failed_jobs(&self) -> Vec<JobId>;

    /// Returns diagnostic statistics for a job.
    fn stats(&self, job: JobId) -> DroverResult<JobStats>;

    /// Stops the driver and releases its resources. Idempotent.
    fn stop(&self);
}
