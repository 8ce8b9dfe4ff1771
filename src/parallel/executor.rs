//! Range Executor
//!
//! Splits an index range into contiguous chunks and processes each chunk on
//! its own scoped worker thread. The caller blocks until every worker joins.

use std::any::Any;
use std::convert::Infallible;
use std::fmt::Display;
use std::ops::Range;
use std::thread;
use tracing::debug;

use super::config::ExecutorConfig;
use crate::error::{ChunkFailure, Result, SpaceError};

/// Split `[0, n)` into at most `workers` contiguous chunks.
///
/// The first chunks all have size `n / workers`; the last one absorbs the
/// remainder. The worker count is capped at `n`, so no chunk is empty.
pub fn partition(n: usize, workers: usize) -> Vec<Range<usize>> {
    if n == 0 || workers == 0 {
        return Vec::new();
    }
    let workers = workers.min(n);
    let chunk_size = n / workers;

    (0..workers)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i + 1 == workers { n } else { start + chunk_size };
            start..end
        })
        .collect()
}

/// Split a slice into disjoint mutable sub-slices following `ranges`.
///
/// `ranges` must tile `[0, slice.len())` in order.
fn split_by_ranges<'a, T>(
    mut slice: &'a mut [T],
    ranges: &[Range<usize>],
) -> Vec<&'a mut [T]> {
    let mut parts = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (head, tail) = std::mem::take(&mut slice).split_at_mut(range.len());
        parts.push(head);
        slice = tail;
    }
    parts
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", s)
    } else {
        "worker panicked".to_string()
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(SpaceError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Data-parallel executor over integer index ranges
#[derive(Debug, Clone)]
pub struct RangeExecutor {
    config: ExecutorConfig,
}

impl Default for RangeExecutor {
    fn default() -> Self {
        Self {
            config: ExecutorConfig::default(),
        }
    }
}

impl RangeExecutor {
    /// Create an executor, rejecting a zero worker count
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Chunk plan this executor would use for `n` indices
    pub fn partition(&self, n: usize) -> Vec<Range<usize>> {
        partition(n, self.config.workers)
    }

    /// Run `op` once for every index in `[0, n)`
    pub fn execute<F>(&self, n: usize, op: F) -> Result<()>
    where
        F: Fn(usize) + Sync,
    {
        self.try_execute(n, |i| {
            op(i);
            Ok::<(), Infallible>(())
        })
    }

    /// Run a fallible `op` once for every index in `[0, n)`.
    ///
    /// A worker stops its chunk at the first error. All workers are joined
    /// before any failure is reported.
    pub fn try_execute<F, E>(&self, n: usize, op: F) -> Result<()>
    where
        F: Fn(usize) -> std::result::Result<(), E> + Sync,
        E: Display,
    {
        let jobs: Vec<(Range<usize>, ())> =
            self.partition(n).into_iter().map(|r| (r, ())).collect();
        self.run_chunks(jobs, |range, ()| {
            for i in range {
                op(i).map_err(|e| format!("index {}: {}", i, e))?;
            }
            Ok(())
        })
    }

    /// Fill `out[i] = op(i)` for every index
    pub fn fill<T, F>(&self, out: &mut [T], op: F) -> Result<()>
    where
        T: Send,
        F: Fn(usize) -> T + Sync,
    {
        self.try_fill(out, |i| Ok::<T, Infallible>(op(i)))
    }

    /// Fallible variant of [`RangeExecutor::fill`]
    pub fn try_fill<T, F, E>(&self, out: &mut [T], op: F) -> Result<()>
    where
        T: Send,
        F: Fn(usize) -> std::result::Result<T, E> + Sync,
        E: Display,
    {
        let ranges = self.partition(out.len());
        let parts = split_by_ranges(out, &ranges);
        let jobs: Vec<(Range<usize>, &mut [T])> = ranges.into_iter().zip(parts).collect();

        self.run_chunks(jobs, |range, part| {
            for (slot, i) in part.iter_mut().zip(range) {
                *slot = op(i).map_err(|e| format!("index {}: {}", i, e))?;
            }
            Ok(())
        })
    }

    /// Fill two output arrays from one pass: `(a[i], b[i]) = op(i)`
    pub fn fill_pair<A, B, F>(&self, a: &mut [A], b: &mut [B], op: F) -> Result<()>
    where
        A: Send,
        B: Send,
        F: Fn(usize) -> (A, B) + Sync,
    {
        check_len(a.len(), b.len())?;
        let ranges = self.partition(a.len());
        let parts_a = split_by_ranges(a, &ranges);
        let parts_b = split_by_ranges(b, &ranges);
        let jobs: Vec<(Range<usize>, (&mut [A], &mut [B]))> = ranges
            .into_iter()
            .zip(parts_a.into_iter().zip(parts_b))
            .collect();

        self.run_chunks(jobs, |range, (pa, pb)| {
            for ((sa, sb), i) in pa.iter_mut().zip(pb.iter_mut()).zip(range) {
                let (va, vb) = op(i);
                *sa = va;
                *sb = vb;
            }
            Ok(())
        })
    }

    /// Fill three output arrays from one pass: `(a[i], b[i], c[i]) = op(i)`
    pub fn fill_triple<A, B, C, F>(
        &self,
        a: &mut [A],
        b: &mut [B],
        c: &mut [C],
        op: F,
    ) -> Result<()>
    where
        A: Send,
        B: Send,
        C: Send,
        F: Fn(usize) -> (A, B, C) + Sync,
    {
        check_len(a.len(), b.len())?;
        check_len(a.len(), c.len())?;
        let ranges = self.partition(a.len());
        let parts_a = split_by_ranges(a, &ranges);
        let parts_b = split_by_ranges(b, &ranges);
        let parts_c = split_by_ranges(c, &ranges);
        let jobs: Vec<(Range<usize>, ((&mut [A], &mut [B]), &mut [C]))> = ranges
            .into_iter()
            .zip(parts_a.into_iter().zip(parts_b).zip(parts_c))
            .collect();

        self.run_chunks(jobs, |range, ((pa, pb), pc)| {
            let slots = pa.iter_mut().zip(pb.iter_mut()).zip(pc.iter_mut());
            for (((sa, sb), sc), i) in slots.zip(range) {
                let (va, vb, vc) = op(i);
                *sa = va;
                *sb = vb;
                *sc = vc;
            }
            Ok(())
        })
    }

    /// Update every item in place: `op(i, &mut items[i])`
    pub fn for_each_mut<T, F>(&self, items: &mut [T], op: F) -> Result<()>
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync,
    {
        let ranges = self.partition(items.len());
        let parts = split_by_ranges(items, &ranges);
        let jobs: Vec<(Range<usize>, &mut [T])> = ranges.into_iter().zip(parts).collect();

        self.run_chunks(jobs, |range, part| {
            for (item, i) in part.iter_mut().zip(range) {
                op(i, item);
            }
            Ok(())
        })
    }

    /// Spawn one scoped worker per job and join them all.
    ///
    /// If a spawn fails, no further workers are started; the ones already
    /// running are still joined before `WorkerSpawn` is returned.
    fn run_chunks<P, W>(&self, jobs: Vec<(Range<usize>, P)>, work: W) -> Result<()>
    where
        P: Send,
        W: Fn(Range<usize>, P) -> std::result::Result<(), String> + Sync,
    {
        if jobs.is_empty() {
            return Ok(());
        }

        let core_ids = if self.config.pin_to_cores {
            core_affinity::get_core_ids().unwrap_or_default()
        } else {
            Vec::new()
        };
        let work = &work;

        let (spawn_error, failures) = thread::scope(|s| {
            let mut handles = Vec::with_capacity(jobs.len());
            let mut spawn_error = None;
            let mut pending = jobs.into_iter().enumerate();

            while let Some((i, (range, payload))) = pending.next() {
                let core_id = core_ids.get(i % core_ids.len().max(1)).copied();
                let chunk = range.clone();

                let spawned = thread::Builder::new()
                    .name(format!("range-worker-{}", i))
                    .spawn_scoped(s, move || {
                        if let Some(core) = core_id {
                            if core_affinity::set_for_current(core) {
                                debug!("Worker {} pinned to core {:?}", i, core);
                            }
                        }
                        let result = work(chunk.clone(), payload);
                        debug!("Worker {} finished from {} to {}", i, chunk.start, chunk.end);
                        result
                    });

                match spawned {
                    Ok(handle) => handles.push((range, handle)),
                    Err(e) => {
                        let unspawned: Vec<Range<usize>> = std::iter::once(range)
                            .chain(pending.by_ref().map(|(_, (r, _))| r))
                            .collect();
                        spawn_error = Some((e, unspawned));
                        break;
                    }
                }
            }

            let mut failures = Vec::new();
            for (range, handle) in handles {
                match handle.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(message)) => failures.push(ChunkFailure { range, message }),
                    Err(panic) => failures.push(ChunkFailure {
                        range,
                        message: panic_message(panic.as_ref()),
                    }),
                }
            }
            (spawn_error, failures)
        });

        if let Some((source, unspawned)) = spawn_error {
            return Err(SpaceError::WorkerSpawn { source, unspawned });
        }
        if !failures.is_empty() {
            return Err(SpaceError::WorkerFailure { failures });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn executor(workers: usize) -> RangeExecutor {
        RangeExecutor::new(ExecutorConfig::default().with_workers(workers)).unwrap()
    }

    #[test]
    fn test_partition_ten_by_three() {
        assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn test_partition_tiles_range() {
        for n in 0..60 {
            for workers in 1..25 {
                let chunks = partition(n, workers);
                let mut next = 0;
                for chunk in &chunks {
                    assert_eq!(chunk.start, next, "gap or overlap at n={} w={}", n, workers);
                    assert!(!chunk.is_empty());
                    next = chunk.end;
                }
                assert_eq!(next, n);
                assert_eq!(chunks.iter().map(|c| c.len()).sum::<usize>(), n);
                assert_eq!(chunks.len(), workers.min(n));
            }
        }
    }

    #[test]
    fn test_partition_caps_workers_at_n() {
        assert_eq!(partition(3, 20), vec![0..1, 1..2, 2..3]);
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = RangeExecutor::new(ExecutorConfig::default().with_workers(0));
        assert!(matches!(result, Err(SpaceError::InvalidWorkerCount(0))));
    }

    #[test]
    fn test_execute_visits_every_index_once() {
        let counts: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();
        executor(7)
            .execute(counts.len(), |i| {
                counts[i].fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        assert!(counts.iter().all(|c| c.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn test_execute_in_order_within_chunk() {
        let seen = Mutex::new(Vec::new());
        executor(3)
            .execute(10, |i| seen.lock().unwrap().push(i))
            .unwrap();
        let seen = seen.into_inner().unwrap();
        for chunk in partition(10, 3) {
            let order: Vec<usize> = seen.iter().copied().filter(|i| chunk.contains(i)).collect();
            assert_eq!(order, chunk.collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_execute_empty_range() {
        let calls = AtomicUsize::new(0);
        executor(4)
            .execute(0, |_| {
                calls.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_fill_by_index() {
        let mut out = vec![0usize; 101];
        executor(6).fill(&mut out, |i| i * 2).unwrap();
        assert!(out.iter().enumerate().all(|(i, v)| *v == i * 2));
    }

    #[test]
    fn test_fill_pair_and_triple() {
        let mut squares = vec![0u64; 50];
        let mut labels = vec![String::new(); 50];
        executor(4)
            .fill_pair(&mut squares, &mut labels, |i| ((i * i) as u64, i.to_string()))
            .unwrap();
        assert_eq!(squares[7], 49);
        assert_eq!(labels[49], "49");

        let mut a = vec![0i32; 9];
        let mut b = vec![0i32; 9];
        let mut c = vec![false; 9];
        executor(2)
            .fill_triple(&mut a, &mut b, &mut c, |i| {
                (i as i32, -(i as i32), i % 2 == 0)
            })
            .unwrap();
        assert_eq!(a[8], 8);
        assert_eq!(b[8], -8);
        assert!(c[8] && !c[7]);
    }

    #[test]
    fn test_fill_pair_length_mismatch() {
        let mut a = vec![0; 4];
        let mut b = vec![0; 5];
        let result = executor(2).fill_pair(&mut a, &mut b, |i| (i, i));
        assert!(matches!(
            result,
            Err(SpaceError::DimensionMismatch { expected: 4, actual: 5 })
        ));
    }

    #[test]
    fn test_for_each_mut() {
        let mut items: Vec<usize> = (0..33).collect();
        executor(5).for_each_mut(&mut items, |i, v| *v += i).unwrap();
        assert!(items.iter().enumerate().all(|(i, v)| *v == 2 * i));
    }

    #[test]
    fn test_error_reports_failed_range_after_join() {
        let calls = AtomicUsize::new(0);
        let result = executor(3).try_execute(10, |i| {
            calls.fetch_add(1, Ordering::Relaxed);
            if i == 4 {
                Err("bad index")
            } else {
                Ok(())
            }
        });

        match result {
            Err(SpaceError::WorkerFailure { failures }) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].range, 3..6);
                assert!(failures[0].message.contains("index 4"));
            }
            other => panic!("expected worker failure, got {:?}", other),
        }
        // Chunk 3..6 stops at index 4; the other chunks run to completion.
        assert_eq!(calls.load(Ordering::Relaxed), 3 + 2 + 4);
    }

    #[test]
    fn test_panics_are_aggregated() {
        let result = executor(4).execute(8, |i| {
            if i == 0 || i == 7 {
                panic!("exploded at {}", i);
            }
        });

        match result {
            Err(SpaceError::WorkerFailure { failures }) => {
                let ranges: Vec<_> = failures.iter().map(|f| f.range.clone()).collect();
                assert_eq!(ranges, vec![0..2, 6..8]);
                assert!(failures[1].message.contains("exploded at 7"));
            }
            other => panic!("expected worker failure, got {:?}", other),
        }
    }

    #[test]
    fn test_try_fill_failure_returns_error() {
        let mut out = vec![0.0f64; 20];
        let result = executor(4).try_fill(&mut out, |i| {
            if i == 19 {
                Err(format!("cannot score {}", i))
            } else {
                Ok(i as f64)
            }
        });
        assert!(matches!(result, Err(SpaceError::WorkerFailure { .. })));
    }
}
