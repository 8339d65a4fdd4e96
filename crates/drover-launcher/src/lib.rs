//! # drover-launcher
//!
//! Job launching and supervision for Drover.
//!
//! A launch compiles a physical plan into stages, binds every stage to one
//! job with dependencies mirroring the stage edges, hands the job graph to an
//! execution engine, and polls the engine's driver at a fixed interval until
//! every job is terminal. Progress notifications fire only when aggregate
//! progress strictly increases. The outcome is a single boolean, backed by
//! statistics for every failed and succeeded job.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use drover_common::DroverConfig;
//! use drover_exec::PlanSpec;
//! use drover_launcher::{LaunchContext, Launcher, LocalEngine};
//!
//! # async fn example(json: &str) -> drover_common::DroverResult<()> {
//! let plan = PlanSpec::from_json(json)
//!     .map_err(|e| drover_common::DroverError::config(e.to_string()))?
//!     .build()?;
//! let engine = Arc::new(LocalEngine::simulated(DroverConfig::default()));
//! let report = Launcher::new()
//!     .launch_with_report(plan, "nightly", &LaunchContext::new(engine))
//!     .await?;
//! println!("completed: {}", report.completed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod job;
pub mod launcher;
pub mod progress;
pub mod supervisor;

pub use engine::{ExecutionEngine, JobControl, JobRunner, LocalEngine, SimulatedRunner};
pub use job::{Job, JobGraph, JobStats, JobStatus};
pub use launcher::{LaunchContext, Launcher};
pub use progress::{LogProgress, ProgressListener, ProgressTracker, RecordedProgress};
pub use supervisor::{CancelHandle, JobSupervisor, LaunchReport};
