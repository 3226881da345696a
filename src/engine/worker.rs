// src/engine/worker.rs
// =============================================================================
// Processing of a single work item, from fetch to output.
//
// Stages:
// 1. Fetch the item's page               -> Skipped(FetchFailed) if empty
// 2. Feed discovered links to the frontier (link items only)
// 3. Classify terminal states            -> Skipped(Terminal(..))
// 4. Extract the title                   -> Skipped(MissingTitle)
// 5. Assemble all pages                  -> Skipped(NoContent) if empty
// 6. Write outputs                       -> Failed(..) on I/O error
//
// Every stage reports through Outcome. Nothing here retries and nothing
// propagates to the pool loop: the pool logs the outcome and moves on.
// =============================================================================

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::engine::assembler::ContentAssembler;
use crate::error::SpiderError;
use crate::extract::{Extractor, TerminalState};
use crate::fetch::PageFetcher;
use crate::frontier::{Frontier, WorkItem};
use crate::store::OutputSink;

/// Why an item produced no output. None of these are faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    FetchFailed,
    Terminal(TerminalState),
    MissingTitle,
    NoContent,
}

#[derive(Debug)]
pub enum Outcome {
    Saved { pages: usize, bytes: usize },
    Skipped(SkipReason),
    Failed(SpiderError),
}

/// Everything a worker needs to process an item. Shared by all workers.
pub struct WorkerContext {
    pub fetcher: Arc<dyn PageFetcher>,
    pub extractor: Arc<dyn Extractor>,
    pub frontier: Arc<dyn Frontier>,
    pub output: Arc<OutputSink>,
}

impl WorkerContext {
    pub async fn process(&self, item: &WorkItem) -> Outcome {
        let url = item.url();

        let Some(html) = self.fetcher.fetch(url).await else {
            return Outcome::Skipped(SkipReason::FetchFailed);
        };

        // A terminal page (a catalogue listing one VIP book) can still link
        // to crawlable ones, so links are taken before classifying
        if let WorkItem::Link(_) = item {
            let links = self.extractor.links(url, &html);
            if !links.is_empty() {
                match self.frontier.absorb(links).await {
                    Ok(added) => debug!(url, added, "absorbed links"),
                    // Losing this page's links doesn't invalidate its content
                    Err(e) => error!(url, error = %e, "failed to record discovered links"),
                }
            }
        }

        if let Some(state) = self.extractor.classify(&html) {
            return Outcome::Skipped(SkipReason::Terminal(state));
        }

        let title = self.extractor.title(&html);
        if title.is_empty() && self.extractor.requires_title() {
            return Outcome::Skipped(SkipReason::MissingTitle);
        }

        let assembled = ContentAssembler::new(self.fetcher.as_ref(), self.extractor.as_ref())
            .assemble(url, &html)
            .await;
        if assembled.content.trim().is_empty() {
            return Outcome::Skipped(SkipReason::NoContent);
        }

        let id = item.id().or_else(|| self.extractor.item_id(url));
        if let Err(e) = self.output.write(id, &title, &assembled.content).await {
            return Outcome::Failed(e);
        }

        info!(
            url,
            id,
            title = %title,
            pages = assembled.pages,
            "saved"
        );
        Outcome::Saved {
            pages: assembled.pages,
            bytes: assembled.content.len(),
        }
    }

    /// Runs `process` in its own task so a panic in an extractor turns into
    /// `Outcome::Failed` instead of killing the worker.
    pub async fn process_isolated(self: &Arc<Self>, item: WorkItem) -> Outcome {
        let ctx = Arc::clone(self);
        let task_item = item.clone();
        let handle = tokio::spawn(async move { ctx.process(&task_item).await });

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => Outcome::Failed(SpiderError::Aborted(join_error.to_string())),
        };
        log_outcome(&item, &outcome);
        outcome
    }
}

fn log_outcome(item: &WorkItem, outcome: &Outcome) {
    let url = item.url();
    match outcome {
        Outcome::Saved { .. } => {}
        Outcome::Skipped(SkipReason::Terminal(state)) => {
            debug!(url, ?state, "skipped: terminal content state");
        }
        Outcome::Skipped(SkipReason::FetchFailed) => warn!(url, "skipped: fetch failed"),
        Outcome::Skipped(SkipReason::MissingTitle) => warn!(url, "skipped: no title found"),
        Outcome::Skipped(SkipReason::NoContent) => warn!(url, "skipped: no content"),
        Outcome::Failed(e) => error!(url, error = %e, "item failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputFlags, StateLayout, UrlTemplate};
    use crate::engine::testing::{FakeExtractor, FakeFetcher};
    use crate::frontier::{LinkFrontier, SequentialFrontier};
    use crate::store::CheckpointStore;
    use std::path::Path;
    use tempfile::TempDir;

    async fn sequential_ctx(
        dir: &Path,
        fetcher: FakeFetcher,
        extractor: FakeExtractor,
    ) -> (Arc<WorkerContext>, StateLayout) {
        let layout = StateLayout::new(dir, "fake");
        let frontier = SequentialFrontier::new(
            "",
            UrlTemplate::new("https://x/p/{id}").unwrap(),
            100,
            1000,
            CheckpointStore::new(layout.checkpoint_file()),
        );
        let output = OutputSink::open(&layout, OutputFlags::default()).await.unwrap();
        let ctx = WorkerContext {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            frontier: Arc::new(frontier),
            output: Arc::new(output),
        };
        (Arc::new(ctx), layout)
    }

    fn seq(id: u64) -> WorkItem {
        WorkItem::Sequence {
            id,
            url: format!("https://x/p/{}", id),
        }
    }

    #[tokio::test]
    async fn test_saved_item_writes_small_file() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default().with_page(
            "https://x/p/100",
            "<title>Hi there</title><content>body</content>",
        );
        let (ctx, layout) = sequential_ctx(dir.path(), fetcher, FakeExtractor::default()).await;

        let outcome = ctx.process(&seq(100)).await;
        assert!(matches!(outcome, Outcome::Saved { pages: 1, bytes: 4 }));

        let item = layout.items_dir().join("0").join("100_Hi_there.txt");
        assert_eq!(std::fs::read_to_string(item).unwrap(), "body");
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let (ctx, layout) =
            sequential_ctx(dir.path(), FakeFetcher::default(), FakeExtractor::default()).await;

        let outcome = ctx.process_isolated(seq(105)).await;
        assert!(matches!(outcome, Outcome::Skipped(SkipReason::FetchFailed)));

        assert_eq!(std::fs::read_dir(layout.items_dir()).unwrap().count(), 0);
        assert_eq!(std::fs::read_to_string(layout.aggregate_file()).unwrap(), "");
    }

    #[tokio::test]
    async fn test_terminal_state_is_a_skip() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default().with_page(
            "https://x/p/101",
            "<terminal>deleted</terminal><title>t</title><content>c</content>",
        );
        let (ctx, _) = sequential_ctx(dir.path(), fetcher, FakeExtractor::default()).await;

        let outcome = ctx.process(&seq(101)).await;
        assert!(matches!(
            outcome,
            Outcome::Skipped(SkipReason::Terminal(TerminalState::Deleted))
        ));
    }

    #[tokio::test]
    async fn test_missing_title_and_content() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default()
            .with_page("https://x/p/102", "<content>c</content>")
            .with_page("https://x/p/103", "<title>t</title><content>  </content>");
        let (ctx, _) = sequential_ctx(dir.path(), fetcher, FakeExtractor::default()).await;

        assert!(matches!(
            ctx.process(&seq(102)).await,
            Outcome::Skipped(SkipReason::MissingTitle)
        ));
        assert!(matches!(
            ctx.process(&seq(103)).await,
            Outcome::Skipped(SkipReason::NoContent)
        ));
    }

    #[tokio::test]
    async fn test_panicking_extractor_is_contained() {
        let dir = TempDir::new().unwrap();
        let fetcher =
            FakeFetcher::default().with_page("https://x/p/104", "<title>t</title><panic/>");
        let (ctx, _) = sequential_ctx(dir.path(), fetcher, FakeExtractor::default()).await;

        let outcome = ctx.process_isolated(seq(104)).await;
        assert!(matches!(outcome, Outcome::Failed(SpiderError::Aborted(_))));
    }

    #[tokio::test]
    async fn test_link_items_feed_the_frontier() {
        let dir = TempDir::new().unwrap();
        let layout = StateLayout::new(dir.path(), "fake");
        let frontier = Arc::new(
            LinkFrontier::open(
                vec!["https://example.com".to_string()],
                layout.links_base_file(),
                layout.crawled_links_file(),
            )
            .await
            .unwrap(),
        );
        let fetcher = FakeFetcher::default().with_page(
            "https://example.com",
            "<link>a</link><link>b</link><link>a</link><content>home</content>",
        );
        let ctx = WorkerContext {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(FakeExtractor::default().title_optional()),
            frontier: frontier.clone(),
            output: Arc::new(
                OutputSink::open(&layout, OutputFlags::default()).await.unwrap(),
            ),
        };

        frontier.refill().await.unwrap();
        let item = frontier.next().await.unwrap().unwrap();
        let outcome = ctx.process(&item).await;

        assert!(matches!(outcome, Outcome::Saved { .. }));
        assert_eq!(
            std::fs::read_to_string(layout.links_base_file()).unwrap(),
            "a\nb\n"
        );
        assert_eq!(frontier.pending().await, 2);
    }

    #[tokio::test]
    async fn test_terminal_link_page_still_feeds_the_frontier() {
        let dir = TempDir::new().unwrap();
        let layout = StateLayout::new(dir.path(), "fake");
        let frontier = Arc::new(
            LinkFrontier::open(
                vec!["https://x/catalogue".to_string()],
                layout.links_base_file(),
                layout.crawled_links_file(),
            )
            .await
            .unwrap(),
        );
        let fetcher = FakeFetcher::default().with_page(
            "https://x/catalogue",
            "<link>https://x/book/1</link><link>https://x/book/2</link><terminal>paywalled</terminal>",
        );
        let ctx = WorkerContext {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(FakeExtractor::default().title_optional()),
            frontier: frontier.clone(),
            output: Arc::new(
                OutputSink::open(&layout, OutputFlags::default()).await.unwrap(),
            ),
        };

        frontier.refill().await.unwrap();
        let item = frontier.next().await.unwrap().unwrap();
        let outcome = ctx.process(&item).await;

        assert!(matches!(
            outcome,
            Outcome::Skipped(SkipReason::Terminal(TerminalState::Paywalled))
        ));
        assert_eq!(frontier.pending().await, 2);
    }

    #[tokio::test]
    async fn test_link_item_with_key_gets_small_file() {
        let dir = TempDir::new().unwrap();
        let layout = StateLayout::new(dir.path(), "fake");
        let frontier = Arc::new(
            LinkFrontier::open(Vec::new(), layout.links_base_file(), layout.crawled_links_file())
                .await
                .unwrap(),
        );
        let fetcher = FakeFetcher::default()
            .with_page("https://x/book/42", "<title>Book</title><content>chapter</content>");
        let ctx = WorkerContext {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(FakeExtractor::default()),
            frontier,
            output: Arc::new(
                OutputSink::open(&layout, OutputFlags::default()).await.unwrap(),
            ),
        };

        let item = WorkItem::Link("https://x/book/42".to_string());
        assert!(matches!(ctx.process(&item).await, Outcome::Saved { .. }));

        let file = layout.items_dir().join("0").join("42_Book.txt");
        assert_eq!(std::fs::read_to_string(file).unwrap(), "chapter");
    }
}
