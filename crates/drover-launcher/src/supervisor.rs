//! Supervision of a submitted job graph.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use drover_common::config::LauncherConfig;
use drover_common::{DroverError, DroverResult};
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::engine::JobControl;
use crate::job::{JobGraph, JobStats, JobStatus};
use crate::progress::{normalized_progress, ProgressListener, ProgressTracker};

/// Outcome of a launch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchReport {
    /// True if the whole job graph completed.
    pub completed: bool,
    /// Completed fraction of the job graph.
    pub progress: f64,
    /// Statistics for every failed job, then every succeeded job.
    pub stats: Vec<JobStats>,
}

impl LaunchReport {
    /// Returns the statistics of failed jobs.
    pub fn failed(&self) -> impl Iterator<Item = &JobStats> {
        self.stats
            .iter()
            .filter(|s| s.status == JobStatus::Failed)
    }

    /// Returns the statistics of succeeded jobs.
    pub fn succeeded(&self) -> impl Iterator<Item = &JobStats> {
        self.stats
            .iter()
            .filter(|s| s.status == JobStatus::Succeeded)
    }
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Requests cancellation of a launch. Clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    /// Creates a handle that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once cancellation was requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Result of one non-blocking poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSample {
    /// Completed fraction of the job graph.
    pub progress: f64,
    /// True if every job is terminal.
    pub finished: bool,
    /// True if this poll notified the progress listener.
    pub notified: bool,
}

/// Watches one submitted job graph until it finishes.
///
/// The supervisor owns the driver and stops it when dropped, so the driver is
/// released on every exit path.
#[derive(Debug)]
pub struct JobSupervisor {
    graph: JobGraph,
    control: Box<dyn JobControl>,
    config: LauncherConfig,
    listener: Arc<dyn ProgressListener>,
    tracker: ProgressTracker,
    cancel: CancelHandle,
}

impl JobSupervisor {
    /// Supervises `control`, which is executing `graph`.
    pub fn new(
        graph: JobGraph,
        control: Box<dyn JobControl>,
        config: LauncherConfig,
        listener: Arc<dyn ProgressListener>,
        cancel: CancelHandle,
    ) -> Self {
        Self {
            graph,
            control,
            config,
            listener,
            tracker: ProgressTracker::new(),
            cancel,
        }
    }

    /// Returns the job graph.
    pub fn graph(&self) -> &JobGraph {
        &self.graph
    }

    /// Returns the driver.
    pub fn control(&self) -> &dyn JobControl {
        self.control.as_ref()
    }

    /// Returns a handle cancelling this supervisor.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    fn progress(&self) -> DroverResult<f64> {
        normalized_progress(
            &self.graph,
            self.control.as_ref(),
            self.config.progress_weighting,
        )
    }

    /// Samples progress without blocking, notifying the listener if it
    /// increased since the previous poll.
    pub fn poll(&mut self) -> DroverResult<PollSample> {
        let finished = self.control.all_finished();
        let progress = self.progress()?;
        let notified = self.tracker.observe(progress);
        if notified {
            self.listener.on_progress(progress);
        }
        Ok(PollSample {
            progress,
            finished,
            notified,
        })
    }

    /// Polls at the configured interval until the job graph finishes, then
    /// reports the outcome.
    ///
    /// Cancellation stops the driver and fails with [`DroverError::Cancelled`].
    pub async fn wait(&mut self) -> DroverResult<LaunchReport> {
        let interval = self.config.poll_interval();
        while !self.control.all_finished() {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.cancel.cancelled() => {}
            }
            if self.cancel.is_cancelled() {
                info!(group = self.graph.group(), "Launch cancelled");
                self.control.stop();
                return Err(DroverError::Cancelled);
            }
            self.poll()?;
        }
        self.finish()
    }

    /// Reports the outcome of a finished job graph.
    ///
    /// An incomplete graph with no failed job means the driver contradicts
    /// itself; that is a fatal [`DroverError::DriverInconsistency`].
    pub fn finish(&mut self) -> DroverResult<LaunchReport> {
        if !self.control.all_finished() {
            return Err(DroverError::execution(format!(
                "job graph {} has not finished",
                self.graph.group()
            )));
        }

        let progress = self.progress()?;
        if self.tracker.observe(progress) {
            self.listener.on_progress(progress);
        }
        let completed = self.config.is_complete(progress);
        let mut stats = Vec::with_capacity(self.graph.len());

        if completed {
            info!(group = self.graph.group(), "Completed successfully");
        } else {
            info!(
                group = self.graph.group(),
                "Unsuccessful attempt. Completed {:.1}% of the job",
                progress * 100.0
            );
            let failed = self.control.failed_jobs();
            if failed.is_empty() {
                return Err(DroverError::driver_inconsistency(format!(
                    "job graph {} finished at {:.1}% with no failed jobs",
                    self.graph.group(),
                    progress * 100.0
                )));
            }
            for job in failed {
                let job_stats = self.control.stats(job)?;
                warn!(job = %job, "{job_stats}");
                stats.push(job_stats);
            }
        }

        for job in self.control.succeeded_jobs() {
            let job_stats = self.control.stats(job)?;
            debug!(job = %job, "{job_stats}");
            stats.push(job_stats);
        }

        Ok(LaunchReport {
            completed,
            progress,
            stats,
        })
    }
}

impl Drop for JobSupervisor {
    fn drop(&mut self) {
        self.control.stop();
    }
}
