//! Executor Configuration

use crate::error::{Result, SpaceError};

/// Worker count used when nothing else is configured
pub const DEFAULT_WORKERS: usize = 20;

/// Parallel executor configuration
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of worker threads per parallel call (capped at the range length)
    pub workers: usize,
    /// Whether to pin workers to CPU cores
    pub pin_to_cores: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            pin_to_cores: false,
        }
    }
}

impl ExecutorConfig {
    /// One worker per logical CPU
    pub fn auto() -> Self {
        Self::default().with_workers(num_cpus::get())
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable or disable core pinning
    pub fn with_pinning(mut self, pin: bool) -> Self {
        self.pin_to_cores = pin;
        self
    }

    /// Reject a zero worker count
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SpaceError::InvalidWorkerCount(self.workers));
        }
        Ok(())
    }
}
