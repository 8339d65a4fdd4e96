//! The launch entry point.

use std::sync::Arc;

use drover_common::{DroverConfig, DroverError, DroverResult};
use drover_exec::{PhysicalPlan, StageCompiler, StagePlan};
use tracing::info;

use crate::engine::ExecutionEngine;
use crate::job::JobGraph;
use crate::progress::{LogProgress, ProgressListener};
use crate::supervisor::{CancelHandle, JobSupervisor, LaunchReport};

/// What a launch runs against: an execution engine, a progress listener and
/// a cancellation handle.
///
/// Every launch made with a context, and with its clones, shares the one
/// cancel handle. Once it is cancelled, later launches fail with
/// [`DroverError::Cancelled`] before submitting anything; install a fresh
/// handle with [`LaunchContext::with_cancel_handle`] to launch again.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    engine: Arc<dyn ExecutionEngine>,
    listener: Arc<dyn ProgressListener>,
    cancel: CancelHandle,
}

impl LaunchContext {
    /// Creates a context logging progress, with a fresh cancel handle.
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            engine,
            listener: Arc::new(LogProgress),
            cancel: CancelHandle::new(),
        }
    }

    /// Replaces the progress listener.
    pub fn with_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Replaces the cancel handle. Launches already running keep the handle
    /// they started with.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the execution engine.
    pub fn engine(&self) -> &Arc<dyn ExecutionEngine> {
        &self.engine
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &DroverConfig {
        self.engine.config()
    }

    /// Returns the handle cancelling launches made with this context.
    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }
}

/// Compiles physical plans into job graphs, runs them and supervises them to
/// a single outcome.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use drover_common::DroverConfig;
/// use drover_exec::physical::PhysicalPlanBuilder;
/// use drover_launcher::{LaunchContext, Launcher, LocalEngine};
///
/// # async fn example() -> drover_common::DroverResult<()> {
/// let mut builder = PhysicalPlanBuilder::new("demo");
/// let load = builder.load("input").unwrap();
/// builder.store("output", &load).unwrap();
///
/// let engine = Arc::new(LocalEngine::simulated(DroverConfig::default()));
/// let completed = Launcher::new()
///     .launch(builder.build(), "demo", &LaunchContext::new(engine))
///     .await?;
/// assert!(completed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Launcher;

impl Launcher {
    /// Creates a launcher.
    pub fn new() -> Self {
        Self
    }

    /// Compiles `plan` into its stage DAG using the engine's compiler settings.
    pub fn compile(
        &self,
        plan: impl Into<Arc<PhysicalPlan>>,
        ctx: &LaunchContext,
    ) -> DroverResult<StagePlan> {
        let compiler = StageCompiler::new(ctx.config().compiler.clone());
        Ok(compiler.compile(plan)?)
    }

    /// Compiles `plan`, binds its stages to jobs named after `group` and
    /// submits them, returning a supervisor without waiting.
    ///
    /// Fails with [`DroverError::Cancelled`] without submitting when the
    /// context's cancel handle was already cancelled.
    pub fn submit(
        &self,
        plan: impl Into<Arc<PhysicalPlan>>,
        group: &str,
        ctx: &LaunchContext,
    ) -> DroverResult<JobSupervisor> {
        let stages = self.compile(plan, ctx)?;
        let graph = JobGraph::bind(&stages, group)?;
        if ctx.cancel.is_cancelled() {
            return Err(DroverError::Cancelled);
        }
        info!(group, stages = stages.len(), jobs = graph.len(), "Launching job graph");

        let control = ctx.engine.submit(&graph)?;
        Ok(JobSupervisor::new(
            graph,
            control,
            ctx.config().launcher.clone(),
            Arc::clone(&ctx.listener),
            ctx.cancel.clone(),
        ))
    }

    /// Runs `plan` to completion and reports the outcome with per-job
    /// statistics.
    pub async fn launch_with_report(
        &self,
        plan: impl Into<Arc<PhysicalPlan>>,
        group: &str,
        ctx: &LaunchContext,
    ) -> DroverResult<LaunchReport> {
        let mut supervisor = self.submit(plan, group, ctx)?;
        supervisor.wait().await
    }

    /// Runs `plan` to completion. Returns true if every job succeeded.
    pub async fn launch(
        &self,
        plan: impl Into<Arc<PhysicalPlan>>,
        group: &str,
        ctx: &LaunchContext,
    ) -> DroverResult<bool> {
        Ok(self.launch_with_report(plan, group, ctx).await?.completed)
    }
}
