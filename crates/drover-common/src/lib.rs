//! # drover-common
//!
//! Common types, errors, and configuration for Drover.
//!
//! This crate provides the foundational pieces shared by every Drover layer:
//!
//! - **Types**: operator, stage and job identifiers (`OperatorKey`, `StageId`, `JobId`)
//! - **Errors**: the unified `DroverError` returned by the launch interface
//! - **Config**: compiler, launcher and logging configuration
//!
//! ## Example
//!
//! ```rust
//! use drover_common::config::DroverConfig;
//! use drover_common::types::KeyGenerator;
//!
//! let config = DroverConfig::default();
//! assert_eq!(config.launcher.poll_interval_ms, 500);
//!
//! let mut keys = KeyGenerator::new("script");
//! assert_eq!(keys.next_key().to_string(), "script-1");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::DroverConfig;
pub use error::{DroverError, DroverResult, ErrorCode};
pub use types::{JobId, KeyGenerator, OperatorKey, StageId};
