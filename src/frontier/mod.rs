// src/frontier/mod.rs
// =============================================================================
// The frontier hands out crawl work and absorbs newly discovered work.
//
// Two variants:
// - LinkFrontier: breadth-first over discovered links, backed by the
//   links-base log and the crawled-links log
// - SequentialFrontier: numeric post IDs allocated in checkpointed batches
//
// Delivery is at-most-once for both: an item is recorded as issued (crawled
// log entry, or checkpoint advance) before any worker sees it. An item lost
// to a crash is skipped on restart, never handed out twice.
//
// Refilling is the expensive part (disk reads, checkpoint writes). Workers
// share a RefillGate so only one of them attempts it at a time; the others
// back off and retry.
// =============================================================================

mod link;
mod sequential;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;

pub use link::LinkFrontier;
pub use sequential::SequentialFrontier;

/// One unit of crawl work. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// A discovered (or seed) URL
    Link(String),
    /// A sequence position rendered into the site's URL template
    Sequence { id: u64, url: String },
}

impl WorkItem {
    pub fn url(&self) -> &str {
        match self {
            WorkItem::Link(url) => url,
            WorkItem::Sequence { url, .. } => url,
        }
    }

    pub fn id(&self) -> Option<u64> {
        match self {
            WorkItem::Link(_) => None,
            WorkItem::Sequence { id, .. } => Some(*id),
        }
    }
}

/// Result of asking the frontier for work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pull {
    Item(WorkItem),
    /// Nothing pending right now; another worker may be refilling
    Wait,
    /// A refill found nothing new to hand out
    Exhausted,
}

/// Cross-worker lock serializing frontier refills.
///
/// Passed explicitly to every worker instead of living in a global.
#[derive(Debug, Clone, Default)]
pub struct RefillGate(Arc<Mutex<()>>);

impl RefillGate {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait Frontier: Send + Sync {
    /// Pops the next pending item without refilling.
    async fn next(&self) -> Result<Option<WorkItem>>;

    /// Loads more work from persisted state. Returns how many items were added.
    async fn refill(&self) -> Result<usize>;

    /// Feeds links discovered on a page back into the frontier.
    /// Returns how many were new.
    async fn absorb(&self, _links: Vec<String>) -> Result<usize> {
        Ok(0)
    }

    async fn pending(&self) -> usize;

    /// Pops the next item, refilling first if the queue is empty.
    ///
    /// Only the worker holding `gate` refills. A worker that finds the gate
    /// taken gets `Pull::Wait` and is expected to back off.
    async fn pull(&self, gate: &RefillGate) -> Result<Pull> {
        if let Some(item) = self.next().await? {
            return Ok(Pull::Item(item));
        }

        let Ok(_guard) = gate.0.try_lock() else {
            return Ok(Pull::Wait);
        };

        // Another worker may have refilled between our pop and the lock
        if let Some(item) = self.next().await? {
            return Ok(Pull::Item(item));
        }

        if self.refill().await? == 0 {
            return Ok(Pull::Exhausted);
        }

        Ok(match self.next().await? {
            Some(item) => Pull::Item(item),
            None => Pull::Wait,
        })
    }
}
