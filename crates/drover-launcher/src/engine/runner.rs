//! Job runners for the local engine.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use drover_common::{JobId, StageId};
use tracing::trace;

use super::local::JobTable;
use crate::job::{Job, JobCounters};

/// Future returned by [`JobRunner::run`]. A failed job yields its reason.
pub type RunnerFuture<'a> = Pin<Box<dyn Future<Output = Result<JobCounters, String>> + Send + 'a>>;

/// Executes the work of a single job.
pub trait JobRunner: fmt::Debug + Send + Sync {
    /// Runs `job` to completion, reporting progress through `ctx`.
    fn run<'a>(&'a self, job: &'a Job, ctx: JobContext) -> RunnerFuture<'a>;
}

/// A running job's view of its driver.
#[derive(Clone)]
pub struct JobContext {
    job: JobId,
    table: Arc<JobTable>,
    stopped: Arc<AtomicBool>,
}

impl JobContext {
    pub(super) fn new(job: JobId, table: Arc<JobTable>, stopped: Arc<AtomicBool>) -> Self {
        Self { job, table, stopped }
    }

    /// Returns the job being run.
    pub fn job(&self) -> JobId {
        self.job
    }

    /// Records the completed fraction of the job. Values are clamped to
    /// `[0, 1]` and never move backwards.
    pub fn report_progress(&self, fraction: f64) {
        self.table.report_progress(self.job, fraction);
    }

    /// Returns true once the driver was stopped; runners should return early.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("job", &self.job)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// A runner that pretends to work: it advances through a fixed number of
/// steps, sleeping between them, and fails the stages it was told to fail
/// halfway through.
#[derive(Debug, Clone)]
pub struct SimulatedRunner {
    steps: u32,
    step_delay: Duration,
    records_per_task: u64,
    failing: HashSet<StageId>,
}

impl Default for SimulatedRunner {
    fn default() -> Self {
        Self {
            steps: 4,
            step_delay: Duration::from_millis(1),
            records_per_task: 100,
            failing: HashSet::new(),
        }
    }
}

impl SimulatedRunner {
    /// Creates a runner with four 1ms steps per job.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of steps per job.
    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps.max(1);
        self
    }

    /// Sets the delay between steps.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Makes the job executing `stage` fail.
    pub fn fail_stage(mut self, stage: StageId) -> Self {
        self.failing.insert(stage);
        self
    }
}

impl JobRunner for SimulatedRunner {
    fn run<'a>(&'a self, job: &'a Job, ctx: JobContext) -> RunnerFuture<'a> {
        Box::pin(async move {
            let fail_after = self.failing.contains(&job.stage).then_some(self.steps / 2);
            for step in 1..=self.steps {
                if ctx.is_stopped() {
                    return Err("driver stopped".to_string());
                }
                tokio::time::sleep(self.step_delay).await;
                if fail_after.is_some_and(|after| step > after) {
                    return Err(format!("simulated failure in {}", job.stage));
                }
                ctx.report_progress(f64::from(step) / f64::from(self.steps));
                trace!(job = %job.id, step, "Simulated step");
            }

            let records = self.records_per_task * job.parallelism as u64;
            Ok(JobCounters::new(records, records))
        })
    }
}
