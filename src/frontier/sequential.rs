// src/frontier/sequential.rs
// =============================================================================
// Sequential-ID frontier: walks a forum's post IDs upward in fixed batches.
//
// Refill protocol:
// 1. Read the checkpointed cursor (or write the configured start value)
// 2. Persist cursor + batch
// 3. Only then enqueue cursor..cursor + batch
//
// The cursor on disk is always past every ID that has ever been queued, so
// refills never overlap, not even across restarts. IDs that were queued but
// not processed when the process died are skipped.
// =============================================================================

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::UrlTemplate;
use crate::error::Result;
use crate::frontier::{Frontier, WorkItem};
use crate::store::CheckpointStore;

pub struct SequentialFrontier {
    namespace: String,
    template: UrlTemplate,
    start: u64,
    batch: u64,
    checkpoint: CheckpointStore,
    queue: Mutex<VecDeque<u64>>,
}

impl SequentialFrontier {
    /// `namespace` fills the template's `{ns}` placeholder (the forum board).
    pub fn new(
        namespace: impl Into<String>,
        template: UrlTemplate,
        start: u64,
        batch: u64,
        checkpoint: CheckpointStore,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            template,
            start,
            batch: batch.max(1),
            checkpoint,
            queue: Mutex::new(VecDeque::new()),
        }
    }
}

#[async_trait]
impl Frontier for SequentialFrontier {
    async fn next(&self) -> Result<Option<WorkItem>> {
        let id = self.queue.lock().await.pop_front();
        Ok(id.map(|id| WorkItem::Sequence {
            id,
            url: self.template.render(&self.namespace, id),
        }))
    }

    async fn refill(&self) -> Result<usize> {
        // Held across the checkpoint round-trip so concurrent refills serialize
        let mut queue = self.queue.lock().await;

        let cursor = self.checkpoint.load_or_init(self.start).await?;
        let end = cursor.saturating_add(self.batch);
        self.checkpoint.save(end).await?;

        queue.extend(cursor..end);
        info!(from = cursor, to = end, "queued id batch");
        Ok((end - cursor) as usize)
    }

    async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }
}
