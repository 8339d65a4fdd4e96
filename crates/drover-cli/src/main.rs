//! Drover command-line interface
//!
//! Compiles physical plans into stage DAGs and launches them on the local
//! engine.
//!
//! # Usage
//!
//! ```bash
//! # Show the stages of a plan
//! drover explain plan.json
//!
//! # Run a plan, failing stage 2 on purpose
//! drover run plan.json --group nightly --fail 2
//!
//! # Print the effective configuration
//! drover --config drover.toml config
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drover_common::DroverConfig;

mod commands;

/// Drover command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "drover",
    author = "Drover Team",
    version,
    about = "Compile and launch Drover dataflow plans",
    long_about = "Compiles physical dataflow plans into stages separated by redistribution\n\
                  boundaries, binds every stage to a job and supervises the jobs to a\n\
                  single outcome."
)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, global = true, value_name = "FILE", env = "DROVER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(long, global = true, env = "DROVER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Default parallelism of redistribution stages
    #[arg(long, global = true, value_name = "N")]
    parallelism: Option<usize>,

    /// Launcher poll interval in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a plan and print its stages
    Explain {
        /// Plan file (JSON)
        plan: PathBuf,
    },
    /// Launch a plan on the local engine with simulated jobs
    Run {
        /// Plan file (JSON)
        plan: PathBuf,

        /// Job group name
        #[arg(short = 'g', long, default_value = "drover")]
        group: String,

        /// Stage whose job fails; repeatable
        #[arg(long = "fail", value_name = "STAGE")]
        fail: Vec<u32>,

        /// Progress steps per simulated job
        #[arg(long, default_value_t = 4)]
        steps: u32,

        /// Delay per simulated step in milliseconds
        #[arg(long, default_value_t = 50)]
        step_delay_ms: u64,

        /// Print the launch report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let config = load_config(&args)?;

    // Initialize logging
    init_logging(&args, &config);

    match args.command {
        Command::Explain { plan } => {
            commands::explain(&config, &plan)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            plan,
            group,
            fail,
            steps,
            step_delay_ms,
            json,
        } => {
            let options = commands::RunOptions {
                group,
                fail,
                steps,
                step_delay_ms,
                json,
            };
            let completed = commands::run(config, &plan, options).await?;
            Ok(if completed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(args: &Args, config: &DroverConfig) {
    let level = if args.verbose {
        "debug"
    } else {
        args.log_level.as_deref().unwrap_or(&config.logging.level)
    };

    let filter = EnvFilter::try_new(format!(
        "drover_cli={level},drover_launcher={level},drover_exec={level},drover_plan={level}"
    ))
    .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<DroverConfig> {
    // Start with defaults
    let mut config = if let Some(path) = &args.config {
        DroverConfig::from_file(path).context("Failed to load config file")?
    } else {
        DroverConfig::default()
    };

    // Override with command-line arguments
    if let Some(parallelism) = args.parallelism {
        config.compiler.default_parallelism = parallelism;
    }
    if let Some(interval) = args.poll_interval_ms {
        config.launcher.poll_interval_ms = interval;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::try_parse_from([
            "drover", "run", "plan.json", "--group", "nightly", "--fail", "1", "--fail", "3",
        ])
        .unwrap();
        match args.command {
            Command::Run {
                plan, group, fail, ..
            } => {
                assert_eq!(plan, PathBuf::from("plan.json"));
                assert_eq!(group, "nightly");
                assert_eq!(fail, vec![1, 3]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let args =
            Args::try_parse_from(["drover", "--parallelism", "8", "--poll-interval-ms", "20", "config"])
                .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.compiler.default_parallelism, 8);
        assert_eq!(config.launcher.poll_interval_ms, 20);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args::try_parse_from(["drover", "--parallelism", "0", "config"]).unwrap();
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[launcher]\npoll_interval_ms = 250").unwrap();

        let path = file.path().to_str().unwrap();
        let args = Args::try_parse_from(["drover", "--config", path, "config"]).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.launcher.poll_interval_ms, 250);
        assert_eq!(config.compiler.default_parallelism, 1);
    }
}
