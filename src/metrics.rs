//! Query Metrics
//!
//! Per-operation counters and latency tracking for the similarity engine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Engine operations tracked by [`Metrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ScoreAll,
    TopK,
    BestMatch,
    Normalize,
}

impl Operation {
    /// Every tracked operation, in report order
    pub const ALL: [Operation; 4] = [
        Operation::ScoreAll,
        Operation::TopK,
        Operation::BestMatch,
        Operation::Normalize,
    ];

    /// Get the operation name
    pub fn name(self) -> &'static str {
        match self {
            Operation::ScoreAll => "score_all",
            Operation::TopK => "top_k",
            Operation::BestMatch => "best_match",
            Operation::Normalize => "normalize_all",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
struct OpStats {
    count: AtomicU64,
    latency_sum_us: AtomicU64,
    latency_min_us: AtomicU64,
    latency_max_us: AtomicU64,
}

impl OpStats {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_min_us: AtomicU64::new(u64::MAX),
            latency_max_us: AtomicU64::new(0),
        }
    }

    fn record(&self, latency_us: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_min_us.fetch_min(latency_us, Ordering::Relaxed);
        self.latency_max_us.fetch_max(latency_us, Ordering::Relaxed);
    }
}

/// Snapshot of one operation's counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpSummary {
    /// Completed operations
    pub count: u64,
    pub avg_latency_us: f64,
    pub min_latency_us: u64,
    pub max_latency_us: u64,
}

/// Metrics collector
#[derive(Debug)]
pub struct Metrics {
    ops: [OpStats; 4],
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            ops: [OpStats::new(), OpStats::new(), OpStats::new(), OpStats::new()],
        }
    }

    /// Record one completed operation
    pub fn record(&self, op: Operation, latency: Duration) {
        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.ops[op.slot()].record(latency_us);
    }

    /// Get total operations count
    pub fn total_ops(&self) -> u64 {
        self.ops
            .iter()
            .map(|s| s.count.load(Ordering::Relaxed))
            .sum()
    }

    /// Counters for a single operation
    pub fn summary_for(&self, op: Operation) -> OpSummary {
        let stats = &self.ops[op.slot()];
        let count = stats.count.load(Ordering::Relaxed);
        let sum = stats.latency_sum_us.load(Ordering::Relaxed);
        let min = stats.latency_min_us.load(Ordering::Relaxed);
        OpSummary {
            count,
            avg_latency_us: if count == 0 { 0.0 } else { sum as f64 / count as f64 },
            min_latency_us: if min == u64::MAX { 0 } else { min },
            max_latency_us: stats.latency_max_us.load(Ordering::Relaxed),
        }
    }

    /// Get a summary of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Operations: {}", self.total_ops())];
        for op in Operation::ALL {
            let s = self.summary_for(op);
            if s.count == 0 {
                continue;
            }
            lines.push(format!(
                "  {}: {} | Latency (µs): avg={:.1}, min={}, max={}",
                op, s.count, s.avg_latency_us, s.min_latency_us, s.max_latency_us
            ));
        }
        lines.join("\n")
    }
}
