// src/engine/mod.rs
// =============================================================================
// The crawl engine: a pool of workers pulling items from a frontier,
// processing each one in isolation, and assembling multi-page content.
// =============================================================================

mod assembler;
mod pool;
mod worker;

#[cfg(test)]
mod testing;

pub use pool::{RunSummary, WorkerPool};
pub use worker::WorkerContext;
