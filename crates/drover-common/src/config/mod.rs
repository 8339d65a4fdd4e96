//! Configuration for Drover.
//!
//! This module provides configuration structures for the stage compiler,
//! the job launcher, and logging.

mod drover;

pub use drover::{CompilerConfig, DroverConfig, LauncherConfig, LoggingConfig, ProgressWeighting};
