//! Parallel Module
//!
//! Chunked data-parallel execution over index ranges.

mod config;
mod executor;

pub use config::{ExecutorConfig, DEFAULT_WORKERS};
pub use executor::{partition, RangeExecutor};
