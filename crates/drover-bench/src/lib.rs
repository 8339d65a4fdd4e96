//! Drover Performance Benchmarks
//!
//! This crate contains benchmarks for the Drover pipeline:
//! - Plan traversal in dependency order
//! - Stage compilation of wide and deep physical plans
//! - Pull evaluation of filter conditions
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p drover-bench
//! ```

pub mod utils;
