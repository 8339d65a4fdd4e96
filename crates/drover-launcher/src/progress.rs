//! Launch progress.
//!
//! Progress is the completed fraction of the whole job graph, in `[0, 1]`.
//! By default every job weighs `1/N`; with [`ProgressWeighting::Parallelism`]
//! jobs weigh in proportion to their task count.

use std::fmt;

use drover_common::config::ProgressWeighting;
use drover_common::DroverResult;
use parking_lot::Mutex;
use tracing::info;

use crate::engine::JobControl;
use crate::job::JobGraph;

/// Receives progress notifications from a supervisor.
pub trait ProgressListener: fmt::Debug + Send + Sync {
    /// Called when normalized progress increased since the previous poll.
    fn on_progress(&self, progress: f64);
}

/// Logs progress as `<pct>% complete`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressListener for LogProgress {
    fn on_progress(&self, progress: f64) {
        info!("{:.1}% complete", progress * 100.0);
    }
}

/// Keeps every notification, for callers that inspect progress afterwards.
#[derive(Debug, Default)]
pub struct RecordedProgress {
    values: Mutex<Vec<f64>>,
}

impl RecordedProgress {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notified values, in order.
    pub fn values(&self) -> Vec<f64> {
        self.values.lock().clone()
    }
}

impl ProgressListener for RecordedProgress {
    fn on_progress(&self, progress: f64) {
        self.values.lock().push(progress);
    }
}

/// Filters polls down to strictly increasing progress values.
#[derive(Debug, Clone, Copy)]
pub struct ProgressTracker {
    last: f64,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self { last: -1.0 }
    }
}

impl ProgressTracker {
    /// Creates a tracker that has seen no poll.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a poll. Returns true if `progress` exceeds the previous poll.
    pub fn observe(&mut self, progress: f64) -> bool {
        let increased = progress > self.last;
        self.last = progress;
        increased
    }

    /// Returns the progress of the previous poll.
    pub fn last(&self) -> Option<f64> {
        (self.last >= 0.0).then_some(self.last)
    }
}

/// Computes the completed fraction of `graph` as reported by `control`.
pub fn normalized_progress(
    graph: &JobGraph,
    control: &dyn JobControl,
    weighting: ProgressWeighting,
) -> DroverResult<f64> {
    if graph.is_empty() {
        return Ok(1.0);
    }

    let mut done = 0.0;
    let mut total = 0.0;
    for job in graph.jobs() {
        let weight = match weighting {
            ProgressWeighting::Equal => 1.0,
            ProgressWeighting::Parallelism => job.parallelism.max(1) as f64,
        };
        done += weight * control.progress(job.id)?.clamp(0.0, 1.0);
        total += weight;
    }
    Ok(done / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_strict_increase() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.last(), None);

        let notified: Vec<f64> = [0.0, 0.25, 0.25, 0.5, 0.5, 1.0]
            .into_iter()
            .filter(|&p| tracker.observe(p))
            .collect();
        assert_eq!(notified, vec![0.0, 0.25, 0.5, 1.0]);
        assert_eq!(tracker.last(), Some(1.0));
    }

    #[test]
    fn test_recorded_progress() {
        let recorder = RecordedProgress::new();
        recorder.on_progress(0.5);
        recorder.on_progress(1.0);
        assert_eq!(recorder.values(), vec![0.5, 1.0]);
    }
}
