//! In-process execution engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use drover_common::{DroverConfig, DroverError, DroverResult, JobId};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::runner::{JobContext, JobRunner, SimulatedRunner};
use super::{ExecutionEngine, JobControl};
use crate::job::{Job, JobCounters, JobGraph, JobStats, JobStatus};

/// Runs job graphs on the current tokio runtime.
///
/// A job starts once all of its dependencies succeeded. When a job fails,
/// every job depending on it is marked failed without running.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    config: DroverConfig,
    runner: Arc<dyn JobRunner>,
}

impl LocalEngine {
    /// Creates an engine executing jobs with `runner`.
    pub fn new(config: DroverConfig, runner: Arc<dyn JobRunner>) -> Self {
        Self { config, runner }
    }

    /// Creates an engine backed by a default [`SimulatedRunner`].
    pub fn simulated(config: DroverConfig) -> Self {
        Self::new(config, Arc::new(SimulatedRunner::new()))
    }

    /// Returns the job runner.
    pub fn runner(&self) -> &Arc<dyn JobRunner> {
        &self.runner
    }
}

impl ExecutionEngine for LocalEngine {
    fn config(&self) -> &DroverConfig {
        &self.config
    }

    fn submit(&self, graph: &JobGraph) -> DroverResult<Box<dyn JobControl>> {
        let handle = Handle::try_current().map_err(|e| {
            DroverError::job_creation(format!("local engine needs a tokio runtime: {e}"))
        })?;
        let control = LocalControl::start(&handle, graph.clone(), Arc::clone(&self.runner));
        Ok(Box::new(control))
    }
}

#[derive(Debug, Clone)]
struct JobState {
    status: JobStatus,
    progress: f64,
    started: Option<Instant>,
    finished: Option<Instant>,
    counters: JobCounters,
    error: Option<String>,
}

impl JobState {
    fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            progress: 0.0,
            started: None,
            finished: None,
            counters: JobCounters::default(),
            error: None,
        }
    }
}

/// What a pending job is waiting for.
enum Readiness {
    Ready,
    Waiting,
    Abandoned(JobId),
}

/// Job states of one submitted graph.
#[derive(Debug)]
pub(crate) struct JobTable {
    graph: JobGraph,
    states: DashMap<JobId, JobState>,
}

impl JobTable {
    fn new(graph: JobGraph) -> Self {
        let states = graph
            .jobs()
            .iter()
            .map(|job| (job.id, JobState::pending()))
            .collect();
        Self { graph, states }
    }

    fn status_of(&self, id: JobId) -> Option<JobStatus> {
        self.states.get(&id).map(|state| state.status)
    }

    fn readiness(&self, job: &Job) -> Readiness {
        let mut ready = true;
        for &dep in &job.dependencies {
            match self.status_of(dep) {
                Some(JobStatus::Succeeded) => {}
                Some(JobStatus::Failed) => return Readiness::Abandoned(dep),
                _ => ready = false,
            }
        }
        if ready {
            Readiness::Ready
        } else {
            Readiness::Waiting
        }
    }

    /// Moves a job to `next`, refusing transitions the job lifecycle forbids.
    fn transition(&self, id: JobId, next: JobStatus) -> bool {
        let Some(mut state) = self.states.get_mut(&id) else {
            return false;
        };
        if !state.status.can_transition_to(next) {
            warn!(job = %id, from = %state.status, to = %next, "Rejected job transition");
            return false;
        }
        state.status = next;
        let now = Instant::now();
        match next {
            JobStatus::Running => state.started = Some(now),
            JobStatus::Succeeded | JobStatus::Failed => state.finished = Some(now),
            JobStatus::Pending => {}
        }
        true
    }

    pub(super) fn report_progress(&self, id: JobId, fraction: f64) {
        if let Some(mut state) = self.states.get_mut(&id) {
            if state.status == JobStatus::Running {
                state.progress = state.progress.max(fraction.clamp(0.0, 1.0));
            }
        }
    }

    fn complete(&self, id: JobId, result: Result<JobCounters, String>) {
        match result {
            Ok(counters) => {
                if self.transition(id, JobStatus::Succeeded) {
                    if let Some(mut state) = self.states.get_mut(&id) {
                        state.progress = 1.0;
                        state.counters = counters;
                    }
                    info!(job = %id, "Job succeeded");
                }
            }
            Err(reason) => {
                if self.transition(id, JobStatus::Failed) {
                    warn!(job = %id, %reason, "Job failed");
                    if let Some(mut state) = self.states.get_mut(&id) {
                        state.error = Some(reason);
                    }
                }
            }
        }
    }

    fn abandon(&self, id: JobId, failed_dependency: JobId) {
        if self.transition(id, JobStatus::Failed) {
            warn!(job = %id, dependency = %failed_dependency, "Job abandoned after dependency failure");
            if let Some(mut state) = self.states.get_mut(&id) {
                state.error = Some(format!("dependency {failed_dependency} failed"));
            }
        }
    }

    fn progress(&self, id: JobId) -> DroverResult<f64> {
        self.states
            .get(&id)
            .map(|state| state.progress)
            .ok_or(DroverError::UnknownJob { job_id: id })
    }

    fn with_status(&self, status: JobStatus) -> Vec<JobId> {
        self.graph
            .jobs()
            .iter()
            .map(|job| job.id)
            .filter(|&id| self.status_of(id) == Some(status))
            .collect()
    }

    fn stats(&self, id: JobId) -> DroverResult<JobStats> {
        let job = self.graph.require(id)?;
        let state = self
            .states
            .get(&id)
            .map(|state| state.clone())
            .ok_or(DroverError::UnknownJob { job_id: id })?;

        let mut stats = JobStats::new(job, state.status).with_counters(state.counters);
        if let Some(started) = state.started {
            let end = state.finished.unwrap_or_else(Instant::now);
            stats = stats.with_duration(end.saturating_duration_since(started));
        }
        if let Some(error) = state.error {
            stats = stats.with_error(error);
        }
        Ok(stats)
    }
}

/// Tasks running job bodies, aborted when the driver stops.
type RunnerTasks = Arc<Mutex<Vec<AbortHandle>>>;

/// Driver of a job graph running on a [`LocalEngine`].
///
/// Stopping the driver, or dropping it, aborts the scheduler and every job
/// still running.
#[derive(Debug)]
pub struct LocalControl {
    table: Arc<JobTable>,
    stopped: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    tasks: RunnerTasks,
}

impl LocalControl {
    fn start(handle: &Handle, graph: JobGraph, runner: Arc<dyn JobRunner>) -> Self {
        let table = Arc::new(JobTable::new(graph));
        let stopped = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let tasks = RunnerTasks::default();

        info!(
            group = table.graph.group(),
            jobs = table.graph.len(),
            "Submitted job graph to local engine"
        );
        let scheduler = handle.spawn(schedule(
            Arc::clone(&table),
            runner,
            Arc::clone(&stopped),
            Arc::clone(&finished),
            Arc::clone(&tasks),
        ));

        Self {
            table,
            stopped,
            finished,
            scheduler: Mutex::new(Some(scheduler)),
            tasks,
        }
    }

    /// Returns the job graph being executed.
    pub fn graph(&self) -> &JobGraph {
        &self.table.graph
    }
}

/// Starts jobs as their dependencies succeed until every job is terminal.
async fn schedule(
    table: Arc<JobTable>,
    runner: Arc<dyn JobRunner>,
    stopped: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    tasks: RunnerTasks,
) {
    let mut running: JoinSet<(JobId, Result<JobCounters, String>)> = JoinSet::new();

    loop {
        // Jobs are in dependency order, so one pass settles chains of
        // abandoned dependents.
        for job in table.graph.jobs() {
            if table.status_of(job.id) != Some(JobStatus::Pending) {
                continue;
            }
            match table.readiness(job) {
                Readiness::Waiting => {}
                Readiness::Abandoned(dep) => table.abandon(job.id, dep),
                Readiness::Ready => {
                    // Checked under the lock so a concurrent stop sees every task.
                    let mut tasks = tasks.lock();
                    if stopped.load(Ordering::Acquire) {
                        return;
                    }
                    if !table.transition(job.id, JobStatus::Running) {
                        continue;
                    }
                    info!(job = %job.id, name = %job.name, "Job started");
                    let id = job.id;
                    let job = job.clone();
                    let runner = Arc::clone(&runner);
                    let ctx = JobContext::new(id, Arc::clone(&table), Arc::clone(&stopped));
                    let task = tokio::spawn(async move { runner.run(&job, ctx).await });
                    tasks.push(task.abort_handle());
                    running.spawn(async move {
                        let result = match task.await {
                            Ok(result) => result,
                            Err(err) => Err(format!("job task ended abnormally: {err}")),
                        };
                        (id, result)
                    });
                }
            }
        }

        match running.join_next().await {
            Some(Ok((id, result))) => table.complete(id, result),
            Some(Err(err)) => error!(%err, "Job supervision task ended abnormally"),
            None => break,
        }
    }

    finished.store(true, Ordering::Release);
    debug!(group = table.graph.group(), "Job graph finished");
}

impl JobControl for LocalControl {
    fn all_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn status(&self, job: JobId) -> DroverResult<JobStatus> {
        self.table
            .status_of(job)
            .ok_or(DroverError::UnknownJob { job_id: job })
    }

    fn progress(&self, job: JobId) -> DroverResult<f64> {
        self.table.progress(job)
    }

    fn succeeded_jobs(&self) -> Vec<JobId> {
        self.table.with_status(JobStatus::Succeeded)
    }

    fn failed_jobs(&self) -> Vec<JobId> {
        self.table.with_status(JobStatus::Failed)
    }

    fn stats(&self, job: JobId) -> DroverResult<JobStats> {
        self.table.stats(job)
    }

    fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(scheduler) = self.scheduler.lock().take() {
            scheduler.abort();
        }
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in &tasks {
            task.abort();
        }
        debug!(
            group = self.table.graph.group(),
            aborted = tasks.len(),
            "Stopped local driver"
        );
    }
}

impl Drop for LocalControl {
    fn drop(&mut self) {
        self.stop();
    }
}
