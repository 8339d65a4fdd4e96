//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use drover_common::{DroverConfig, StageId};
use drover_exec::{PhysicalPlan, PlanSpec, StageCompiler};
use drover_launcher::{LaunchContext, LaunchReport, Launcher, LocalEngine, SimulatedRunner};

/// Options of the `run` subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub group: String,
    pub fail: Vec<u32>,
    pub steps: u32,
    pub step_delay_ms: u64,
    pub json: bool,
}

/// Reads and builds a JSON plan file.
pub fn read_plan(path: &Path) -> Result<PhysicalPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan {}", path.display()))?;
    let spec = PlanSpec::from_json(&content)
        .with_context(|| format!("Failed to parse plan {}", path.display()))?;
    spec.build().context("Invalid plan")
}

pub fn explain(config: &DroverConfig, path: &Path) -> Result<()> {
    let plan = read_plan(path)?;
    let stages = StageCompiler::new(config.compiler.clone())
        .compile(plan)
        .context("Failed to compile plan")?;
    print!("{}", stages.explain());
    Ok(())
}

/// Launches the plan and prints its report. Returns true if every job
/// succeeded.
pub async fn run(config: DroverConfig, path: &Path, options: RunOptions) -> Result<bool> {
    let plan = read_plan(path)?;

    let mut runner = SimulatedRunner::new()
        .with_steps(options.steps)
        .with_step_delay(Duration::from_millis(options.step_delay_ms));
    for stage in &options.fail {
        runner = runner.fail_stage(StageId::new(*stage));
    }

    let engine = LocalEngine::new(config, Arc::new(runner));
    let ctx = LaunchContext::new(Arc::new(engine));

    // Ctrl+C cancels the launch
    let cancel = ctx.cancel_handle().clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping jobs");
            cancel.cancel();
        }
    });

    let report = Launcher::new()
        .launch_with_report(plan, &options.group, &ctx)
        .await
        .context("Launch failed")?;

    print_report(&report, options.json)?;
    if report.completed {
        info!(group = %options.group, "All jobs succeeded");
    }
    Ok(report.completed)
}

fn print_report(report: &LaunchReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let outcome = if report.completed { "succeeded" } else { "failed" };
    println!("Launch {outcome} ({:.1}% complete)", report.progress * 100.0);
    for stats in &report.stats {
        println!("  {stats}");
    }
    Ok(())
}
