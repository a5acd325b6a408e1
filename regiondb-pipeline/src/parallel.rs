//! Parallel execution of one depth level.
//!
//! Divisions at the same depth are never ancestors of one another, so a
//! level is embarrassingly parallel. The level is split into contiguous
//! chunks, one scoped thread per chunk, and every worker opens its own store
//! connection; each aggregate commits on its own, so progress is durable
//! division by division and an interrupted run resumes where it stopped.
//!
//! Failure handling inside a worker is two-tier: a geometry failure affects
//! only its division (logged, counted, siblings continue), while a store
//! failure aborts the worker's chunk. The scope join is the level barrier,
//! so even a failing level never lets the next, shallower level start on
//! incomplete input.

use crate::aggregate::{aggregate_division, AggregateConfig, AggregateOutcome};
use crate::error::{PipelineError, Result};
use regiondb_store::{DivisionStore, PendingDivision};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cooperative cancellation flag, checked between divisions. Cancelling
/// never interrupts a write in flight, so the store stays consistent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-level counters, summed across workers.
#[derive(Debug, Default, Clone)]
pub struct LevelTally {
    pub merged: u64,
    pub no_children: u64,
    pub stale: u64,
    pub failed: u64,
}

impl LevelTally {
    fn absorb(&mut self, other: &LevelTally) {
        self.merged += other.merged;
        self.no_children += other.no_children;
        self.stale += other.stale;
        self.failed += other.failed;
    }
}

/// Run one depth level to completion across the configured worker count.
pub fn aggregate_level(
    db_path: &Path,
    divisions: &[PendingDivision],
    config: &AggregateConfig,
    cancel: &CancelToken,
) -> Result<LevelTally> {
    if divisions.is_empty() {
        return Ok(LevelTally::default());
    }
    let workers = config.workers.max(1).min(divisions.len());
    let chunk_size = divisions.len().div_ceil(workers);

    let results: Vec<Result<LevelTally>> = std::thread::scope(|scope| {
        let handles: Vec<_> = divisions
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || run_chunk(db_path, chunk, config, cancel))
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("worker panicked")).collect()
    });

    let mut tally = LevelTally::default();
    let mut first_error = None;
    for result in results {
        match result {
            Ok(worker_tally) => tally.absorb(&worker_tally),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    // Errors surface only after every worker has joined: the level barrier
    // holds even on failure.
    match first_error {
        Some(err) => Err(err),
        None => Ok(tally),
    }
}

fn run_chunk(
    db_path: &Path,
    chunk: &[PendingDivision],
    config: &AggregateConfig,
    cancel: &CancelToken,
) -> Result<LevelTally> {
    let store = DivisionStore::open(db_path)?;
    let mut tally = LevelTally::default();

    for division in chunk {
        if cancel.is_cancelled() {
            debug!(remaining = chunk.len(), "cancellation observed, chunk stopped");
            break;
        }
        match aggregate_division(&store, division.id, &division.name, &config.stages) {
            Ok(AggregateOutcome::Merged { .. }) => tally.merged += 1,
            Ok(AggregateOutcome::NoChildren) => tally.no_children += 1,
            Ok(AggregateOutcome::Stale) => tally.stale += 1,
            Err(PipelineError::Geometry { id, name, source }) => {
                warn!(id, %name, %source, "division skipped, siblings continue");
                tally.failed += 1;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(tally)
}

/// Run every pending level, deepest first.
pub fn aggregate_all(
    db_path: &Path,
    config: &AggregateConfig,
    cancel: &CancelToken,
) -> Result<LevelTally> {
    let store = DivisionStore::open(db_path)?;
    let groups = crate::depth::schedule(&store)?;
    drop(store);

    let mut total = LevelTally::default();
    for group in &groups {
        if cancel.is_cancelled() {
            info!(depth = group.depth, "cancellation observed, remaining levels skipped");
            break;
        }
        let tally = aggregate_level(db_path, &group.divisions, config, cancel)?;
        info!(
            depth = group.depth,
            merged = tally.merged,
            no_children = tally.no_children,
            stale = tally.stale,
            failed = tally.failed,
            "level finished"
        );
        total.absorb(&tally);
    }
    Ok(total)
}
