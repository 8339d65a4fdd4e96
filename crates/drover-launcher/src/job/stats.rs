//! Per-job statistics.

use std::fmt;
use std::time::Duration;

use drover_common::{JobId, StageId};
use serde::Serialize;

use super::{Job, JobStatus};

/// Records processed by a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounters {
    /// Records read.
    pub records_in: u64,
    /// Records written.
    pub records_out: u64,
}

impl JobCounters {
    /// Creates counters.
    pub fn new(records_in: u64, records_out: u64) -> Self {
        Self {
            records_in,
            records_out,
        }
    }
}

/// Diagnostic statistics for one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStats {
    /// Job identity.
    pub id: JobId,
    /// Job name.
    pub name: String,
    /// The stage the job executed.
    pub stage: StageId,
    /// Status when the statistics were taken.
    pub status: JobStatus,
    /// Time spent running, if the job started.
    pub duration: Option<Duration>,
    /// Records processed.
    pub counters: JobCounters,
    /// Failure reason.
    pub error: Option<String>,
}

impl JobStats {
    /// Creates statistics for `job` with no timing, counters or error.
    pub fn new(job: &Job, status: JobStatus) -> Self {
        Self {
            id: job.id,
            name: job.name.clone(),
            stage: job.stage,
            status,
            duration: None,
            counters: JobCounters::default(),
            error: None,
        }
    }

    /// Sets the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets the counters.
    pub fn with_counters(mut self, counters: JobCounters) -> Self {
        self.counters = counters;
        self
    }

    /// Sets the failure reason.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl fmt::Display for JobStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {}: {} in, {} out",
            self.name, self.id, self.status, self.counters.records_in, self.counters.records_out
        )?;
        if let Some(duration) = self.duration {
            write!(f, ", {}ms", duration.as_millis())?;
        }
        if let Some(error) = &self.error {
            write!(f, ", error: {error}")?;
        }
        Ok(())
    }
}
