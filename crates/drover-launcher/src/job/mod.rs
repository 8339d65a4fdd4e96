//! Jobs bound to stages.
//!
//! Each stage of a [`StagePlan`](drover_exec::StagePlan) becomes one job, and
//! every stage edge becomes a job dependency. A job moves through
//! `Pending -> Running -> {Succeeded | Failed}` and never leaves a terminal
//! state. A job may also go straight from `Pending` to `Failed` when one of its
//! dependencies failed; it is then never run.

mod graph;
mod stats;

pub use graph::JobGraph;
pub use stats::{JobCounters, JobStats};

use std::fmt;

use drover_common::{JobId, OperatorKey, StageId};
use drover_exec::StageKind;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for dependencies.
    Pending,
    /// Executing.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished unsuccessfully, or abandoned after a dependency failed.
    Failed,
}

impl JobStatus {
    /// Returns true once no further state change can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Returns true if a job may move from `self` to `next`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Succeeded)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A backend job executing one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    /// Job identity.
    pub id: JobId,
    /// Job name, `<group>-<stage>`.
    pub name: String,
    /// The stage this job executes.
    pub stage: StageId,
    /// Kind of the stage.
    pub kind: StageKind,
    /// Number of parallel tasks.
    pub parallelism: usize,
    /// Operators executed by the job.
    pub operators: Vec<OperatorKey>,
    /// Jobs that must succeed before this one starts.
    pub dependencies: Vec<JobId>,
}
