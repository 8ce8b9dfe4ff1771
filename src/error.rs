//! Error Types
//!
//! Contract violations and I/O failures raised by the vector space.

use std::fmt;
use std::io;
use std::ops::Range;
use thiserror::Error;

/// A chunk of a parallel call that did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// Index range assigned to the failed worker
    pub range: Range<usize>,
    /// Error or panic message reported by the worker
    pub message: String,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}): {}", self.range.start, self.range.end, self.message)
    }
}

/// Errors raised by the store, the engine and the parallel executor
#[derive(Error, Debug)]
pub enum SpaceError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid worker count: {0} (must be at least 1)")]
    InvalidWorkerCount(usize),

    #[error("{} worker(s) failed: {}", .failures.len(), join_failures(.failures))]
    WorkerFailure { failures: Vec<ChunkFailure> },

    /// A worker thread could not be started. Chunks spawned before it ran
    /// to completion and were joined, but their results are discarded.
    #[error("Failed to spawn worker thread ({} chunk(s) not run): {source}", .unspawned.len())]
    WorkerSpawn {
        #[source]
        source: io::Error,
        /// Ranges that never started
        unspawned: Vec<Range<usize>>,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid command: {0}")]
    Command(String),
}

fn join_failures(failures: &[ChunkFailure]) -> String {
    failures
        .iter()
        .map(ChunkFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, SpaceError>;
