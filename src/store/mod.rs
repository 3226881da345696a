// src/store/mod.rs
// =============================================================================
// Everything the crawler persists between runs.
//
// Submodules:
// - dedup: append-only identifier log + in-memory set (crawled links,
//   content fingerprints)
// - checkpoint: the Sequential-ID cursor
// - output: per-item, aggregate and deduplicated text output
// =============================================================================

mod checkpoint;
mod dedup;
mod output;

pub use checkpoint::CheckpointStore;
pub use dedup::DedupStore;
pub use output::OutputSink;
