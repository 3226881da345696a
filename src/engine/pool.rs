// src/engine/pool.rs
// =============================================================================
// A fixed number of workers pulling from one shared frontier.
//
// Each worker loops:
// 1. Pull an item (refilling the frontier if this worker wins the gate)
// 2. Process it in an isolated task and record the outcome
// 3. If there was nothing to pull, sleep for base + jitter and try again
//
// The loop ends when the cancellation token fires. The pool fires it itself
// once a refill comes back empty while no other worker is holding an item,
// since nothing can add work after that point.
// =============================================================================

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Backoff;
use crate::engine::worker::{Outcome, SkipReason, WorkerContext};
use crate::frontier::{Frontier, Pull, RefillGate};

/// Live counters shared by all workers.
#[derive(Debug, Default)]
pub struct PoolStats {
    issued: AtomicU64,
    saved: AtomicU64,
    pages: AtomicU64,
    fetch_failed: AtomicU64,
    terminal: AtomicU64,
    missing_title: AtomicU64,
    no_content: AtomicU64,
    failed: AtomicU64,
}

impl PoolStats {
    fn record(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Saved { pages, .. } => {
                self.pages.fetch_add(*pages as u64, Ordering::Relaxed);
                &self.saved
            }
            Outcome::Skipped(SkipReason::FetchFailed) => &self.fetch_failed,
            Outcome::Skipped(SkipReason::Terminal(_)) => &self.terminal,
            Outcome::Skipped(SkipReason::MissingTitle) => &self.missing_title,
            Outcome::Skipped(SkipReason::NoContent) => &self.no_content,
            Outcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            issued: self.issued.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
            pages: self.pages.load(Ordering::Relaxed),
            fetch_failed: self.fetch_failed.load(Ordering::Relaxed),
            terminal: self.terminal.load(Ordering::Relaxed),
            missing_title: self.missing_title.load(Ordering::Relaxed),
            no_content: self.no_content.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of PoolStats, printed at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub issued: u64,
    pub saved: u64,
    pub pages: u64,
    pub fetch_failed: u64,
    pub terminal: u64,
    pub missing_title: u64,
    pub no_content: u64,
    pub failed: u64,
}

impl RunSummary {
    pub fn skipped(&self) -> u64 {
        self.fetch_failed + self.terminal + self.missing_title + self.no_content
    }
}

pub struct WorkerPool {
    ctx: Arc<WorkerContext>,
    workers: usize,
    backoff: Backoff,
    gate: RefillGate,
    stats: Arc<PoolStats>,
    // Workers currently pulling or holding an item
    active: Arc<AtomicUsize>,
}

impl WorkerPool {
    pub fn new(ctx: WorkerContext, workers: usize, backoff: Backoff) -> Self {
        Self {
            ctx: Arc::new(ctx),
            workers: workers.max(1),
            backoff,
            gate: RefillGate::new(),
            stats: Arc::new(PoolStats::default()),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[cfg(test)]
    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.stats)
    }

    /// Runs until `cancel` fires or the frontier is exhausted.
    pub async fn run(self, cancel: CancellationToken) -> RunSummary {
        info!(workers = self.workers, "starting worker pool");

        let handles = (0..self.workers).map(|index| {
            let worker = Worker {
                index,
                ctx: Arc::clone(&self.ctx),
                gate: self.gate.clone(),
                stats: Arc::clone(&self.stats),
                active: Arc::clone(&self.active),
                backoff: self.backoff,
                cancel: cancel.clone(),
            };
            tokio::spawn(worker.run())
        });

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "worker task ended abnormally");
            }
        }

        let summary = self.stats.summary();
        info!(?summary, "worker pool stopped");
        summary
    }
}

struct Worker {
    index: usize,
    ctx: Arc<WorkerContext>,
    gate: RefillGate,
    stats: Arc<PoolStats>,
    active: Arc<AtomicUsize>,
    backoff: Backoff,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        debug!(worker = self.index, "worker started");
        let frontier: &dyn Frontier = self.ctx.frontier.as_ref();

        while !self.cancel.is_cancelled() {
            // Counted before pulling so an exhausted refill elsewhere can't
            // miss an item that is about to be popped
            self.active.fetch_add(1, Ordering::AcqRel);

            match frontier.pull(&self.gate).await {
                Ok(Pull::Item(item)) => {
                    self.stats.issued.fetch_add(1, Ordering::Relaxed);
                    let outcome = self.ctx.process_isolated(item).await;
                    self.stats.record(&outcome);
                    self.active.fetch_sub(1, Ordering::AcqRel);
                    continue;
                }
                Ok(Pull::Exhausted) => {
                    let others = self.active.fetch_sub(1, Ordering::AcqRel) - 1;
                    if others == 0 && frontier.pending().await == 0 {
                        info!(worker = self.index, "frontier exhausted, run complete");
                        self.cancel.cancel();
                        break;
                    }
                }
                Ok(Pull::Wait) => {
                    self.active.fetch_sub(1, Ordering::AcqRel);
                }
                Err(e) => {
                    self.active.fetch_sub(1, Ordering::AcqRel);
                    error!(worker = self.index, error = %e, "frontier failure");
                }
            }

            let pause = self.backoff.sample();
            debug!(worker = self.index, ?pause, "frontier empty, backing off");
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        debug!(worker = self.index, "worker stopped");
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why atomics for the counters?
//    - Every worker updates them concurrently
//    - fetch_add on an AtomicU64 needs no lock
//    - Relaxed ordering is enough: nobody reads them to make decisions
//
// 2. Why is `active` incremented before pulling?
//    - A worker that just popped the last item is still "active"
//    - Otherwise another worker could see an empty queue, find nobody
//      active, and end the run while that item is still producing links
//
// 3. What does tokio::select! do here?
//    - Waits on the sleep and the cancellation at the same time
//    - Whichever finishes first wins, so Ctrl-C doesn't wait out a 40s backoff
// -----------------------------------------------------------------------------
