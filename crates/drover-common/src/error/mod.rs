//! Error handling for Drover.
//!
//! This module provides the unified error type and result alias returned
//! by the launch interface. Each layer keeps its own narrower error enum
//! and converts into [`DroverError`] at the crate boundary.

mod drover;

pub use drover::{DroverError, ErrorCode};

/// Result type alias for Drover operations.
pub type DroverResult<T> = std::result::Result<T, DroverError>;
