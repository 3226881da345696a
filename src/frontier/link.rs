// src/frontier/link.rs
// =============================================================================
// Breadth-first link frontier that survives restarts.
//
// How it works:
// 1. Pending links sit in an in-memory FIFO queue
// 2. Every link ever discovered is appended to the links-base log
// 3. When a link is issued it is marked in the crawled log
// 4. When the queue runs dry, refill() replays the links-base log and queues
//    whatever is neither crawled nor already queued
// 5. If that still yields nothing, the seeds are queued
//
// So after a restart the crawl picks up exactly the links that were
// discovered but never issued.
//
// Seeds are allowed through even if an earlier run crawled them: they are
// typically home or catalogue pages whose links change over time. Until
// this run discovers a new link, an empty refill re-queues them, up to
// SEED_ROUNDS times, so one failed seed fetch doesn't end the crawl.
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, SpiderError};
use crate::frontier::{Frontier, WorkItem};
use crate::store::DedupStore;

/// Times the seeds are queued in a run that has discovered nothing yet.
const SEED_ROUNDS: u32 = 5;

struct LinkQueue {
    pending: VecDeque<String>,
    // Mirrors `pending` for O(1) membership checks
    queued: HashSet<String>,
    links_base: File,
    seed_rounds: u32,
    // Set once absorb() records a new link in this run
    discovered: bool,
}

impl LinkQueue {
    fn push(&mut self, link: String) -> bool {
        if !self.queued.insert(link.clone()) {
            return false;
        }
        self.pending.push_back(link);
        true
    }
}

pub struct LinkFrontier {
    seeds: Vec<String>,
    links_base_path: PathBuf,
    crawled: DedupStore,
    state: Mutex<LinkQueue>,
}

impl LinkFrontier {
    /// Opens the links-base and crawled logs. The queue starts empty; the
    /// first refill loads it.
    pub async fn open(
        seeds: Vec<String>,
        links_base_path: impl Into<PathBuf>,
        crawled_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let links_base_path = links_base_path.into();
        let crawled = DedupStore::open(crawled_path).await?;
        info!(crawled = crawled.len().await, "loaded crawled links");

        let links_base = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&links_base_path)
            .await
            .map_err(SpiderError::io(&links_base_path))?;

        Ok(Self {
            seeds,
            links_base_path,
            crawled,
            state: Mutex::new(LinkQueue {
                pending: VecDeque::new(),
                queued: HashSet::new(),
                links_base,
                seed_rounds: 0,
                discovered: false,
            }),
        })
    }

    fn is_seed(&self, url: &str) -> bool {
        self.seeds.iter().any(|seed| seed == url)
    }
}

#[async_trait]
impl Frontier for LinkFrontier {
    async fn next(&self) -> Result<Option<WorkItem>> {
        loop {
            let url = {
                let mut state = self.state.lock().await;
                match state.pending.pop_front() {
                    Some(url) => {
                        state.queued.remove(&url);
                        url
                    }
                    None => return Ok(None),
                }
            };

            // Recorded before the fetch: a crash mid-item loses the link
            let fresh = self.crawled.mark(&url).await?;
            if fresh || self.is_seed(&url) {
                return Ok(Some(WorkItem::Link(url)));
            }
            debug!(url = %url, "already crawled");
        }
    }

    async fn refill(&self) -> Result<usize> {
        let mut state = self.state.lock().await;

        let base = match tokio::fs::read_to_string(&self.links_base_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(SpiderError::io(&self.links_base_path)(e)),
        };

        let mut added = 0;
        for line in base.lines() {
            let link = line.trim();
            if link.is_empty() || state.queued.contains(link) {
                continue;
            }
            if self.crawled.seen(link).await {
                continue;
            }
            if state.push(link.to_string()) {
                added += 1;
            }
        }

        if state.pending.is_empty() && !state.discovered && state.seed_rounds < SEED_ROUNDS {
            state.seed_rounds += 1;
            for seed in &self.seeds {
                if state.push(seed.clone()) {
                    added += 1;
                }
            }
            debug!(seeds = self.seeds.len(), round = state.seed_rounds, "queued seeds");
        }

        info!(added, pending = state.pending.len(), "link frontier refilled");
        Ok(added)
    }

    async fn absorb(&self, links: Vec<String>) -> Result<usize> {
        let mut state = self.state.lock().await;

        let mut fresh = Vec::new();
        let mut batch = HashSet::new();
        for link in links {
            let link = link.trim().to_string();
            if link.is_empty() || state.queued.contains(&link) || batch.contains(&link) {
                continue;
            }
            if self.crawled.seen(&link).await {
                continue;
            }
            batch.insert(link.clone());
            fresh.push(link);
        }

        if fresh.is_empty() {
            return Ok(0);
        }

        // Log first: a link only enters the queue once it is durable
        let mut lines = fresh.join("\n");
        lines.push('\n');
        state
            .links_base
            .write_all(lines.as_bytes())
            .await
            .map_err(SpiderError::io(&self.links_base_path))?;
        state
            .links_base
            .flush()
            .await
            .map_err(SpiderError::io(&self.links_base_path))?;

        let added = fresh.len();
        for link in fresh {
            state.push(link);
        }
        state.discovered = true;
        Ok(added)
    }

    async fn pending(&self) -> usize {
        self.state.lock().await.pending.len()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why both a VecDeque and a HashSet for the queue?
//    - VecDeque keeps breadth-first order (push_back / pop_front)
//    - HashSet answers "is this already queued?" without scanning
//
// 2. Why is the crawled log written in next() and not after the fetch?
//    - A link is recorded the moment it is handed out
//    - If the process dies mid-fetch, that link is skipped on restart
//      instead of being fetched twice
//
// 3. Why write discovered links to disk before queueing them?
//    - The in-memory queue is lost on restart; the links-base log is not
//    - refill() rebuilds the queue from that log
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    async fn open(dir: &Path, seeds: &[&str]) -> LinkFrontier {
        LinkFrontier::open(
            seeds.iter().map(|s| s.to_string()).collect(),
            dir.join("links_base.txt"),
            dir.join("crawled.txt"),
        )
        .await
        .unwrap()
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_seed_then_discovered_links() {
        let dir = TempDir::new().unwrap();
        let frontier = open(dir.path(), &["https://example.com"]).await;

        assert_eq!(frontier.refill().await.unwrap(), 1);
        let seed = frontier.next().await.unwrap().unwrap();
        assert_eq!(seed, WorkItem::Link("https://example.com".to_string()));

        let added = frontier
            .absorb(vec!["a".to_string(), "b".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(lines(&dir.path().join("links_base.txt")), vec!["a", "b"]);

        assert_eq!(frontier.next().await.unwrap().unwrap().url(), "a");
        assert_eq!(frontier.next().await.unwrap().unwrap().url(), "b");
        assert_eq!(frontier.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_absorb_skips_queued_and_crawled() {
        let dir = TempDir::new().unwrap();
        let frontier = open(dir.path(), &["s"]).await;

        frontier.absorb(vec!["a".to_string()]).await.unwrap();
        // "a" is still queued
        assert_eq!(frontier.absorb(vec!["a".to_string()]).await.unwrap(), 0);

        frontier.next().await.unwrap();
        // "a" is now crawled
        assert_eq!(frontier.absorb(vec!["a".to_string()]).await.unwrap(), 0);
        assert_eq!(lines(&dir.path().join("links_base.txt")), vec!["a"]);
    }

    #[tokio::test]
    async fn test_issued_links_are_logged_as_crawled() {
        let dir = TempDir::new().unwrap();
        let frontier = open(dir.path(), &["s"]).await;
        frontier
            .absorb(vec!["x".to_string(), "y".to_string()])
            .await
            .unwrap();

        frontier.next().await.unwrap();
        frontier.next().await.unwrap();

        assert_eq!(lines(&dir.path().join("crawled.txt")), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_restart_requeues_only_uncrawled_links() {
        let dir = TempDir::new().unwrap();
        {
            let first_run = open(dir.path(), &["s"]).await;
            first_run
                .absorb(vec!["a".to_string(), "b".to_string(), "c".to_string()])
                .await
                .unwrap();
            first_run.next().await.unwrap();
        }

        let second_run = open(dir.path(), &["s"]).await;
        assert_eq!(second_run.refill().await.unwrap(), 2);

        let mut issued = Vec::new();
        while let Some(item) = second_run.next().await.unwrap() {
            issued.push(item.url().to_string());
        }
        assert_eq!(issued, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_seeds_stop_once_links_are_discovered() {
        let dir = TempDir::new().unwrap();
        let frontier = open(dir.path(), &["https://example.com"]).await;

        assert_eq!(frontier.refill().await.unwrap(), 1);
        frontier.next().await.unwrap();
        frontier.absorb(vec!["a".to_string()]).await.unwrap();
        frontier.next().await.unwrap();

        // "a" is crawled and the seed already produced it
        assert_eq!(frontier.refill().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unproductive_seeds_are_retried_a_bounded_number_of_times() {
        let dir = TempDir::new().unwrap();
        let frontier = open(dir.path(), &["https://example.com"]).await;

        for _ in 0..SEED_ROUNDS {
            assert_eq!(frontier.refill().await.unwrap(), 1);
            let item = frontier.next().await.unwrap();
            assert_eq!(item, Some(WorkItem::Link("https://example.com".to_string())));
        }
        assert_eq!(frontier.refill().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_is_recrawled_after_restart() {
        let dir = TempDir::new().unwrap();
        {
            let first_run = open(dir.path(), &["https://example.com"]).await;
            first_run.refill().await.unwrap();
            first_run.next().await.unwrap();
        }

        let second_run = open(dir.path(), &["https://example.com"]).await;
        assert_eq!(second_run.refill().await.unwrap(), 1);
        let item = second_run.next().await.unwrap();
        assert_eq!(item, Some(WorkItem::Link("https://example.com".to_string())));
    }

    #[tokio::test]
    async fn test_duplicate_queue_entries_are_issued_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("links_base.txt"), "a\na\nb\n").unwrap();
        let frontier = open(dir.path(), &[]).await;

        assert_eq!(frontier.refill().await.unwrap(), 2);
        assert_eq!(frontier.pending().await, 2);
    }
}
