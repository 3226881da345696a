// src/store/dedup.rs
// =============================================================================
// Durable set of identifiers (links, fingerprints) that have been admitted.
//
// On disk: an append-only log, one identifier per line.
// In memory: a HashSet rebuilt by replaying that log at startup.
//
// mark() checks membership, appends to the log and inserts into the set while
// holding one lock, so two workers racing on the same identifier can't both
// be admitted. The log line is flushed before the in-memory insert: if the
// append fails the set is left untouched.
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, SpiderError};

struct DedupInner {
    seen: HashSet<String>,
    log: File,
}

pub struct DedupStore {
    path: PathBuf,
    inner: Mutex<DedupInner>,
}

impl DedupStore {
    /// Opens (or creates) the log at `path` and replays it into memory.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let seen = replay(&path).await?;
        debug!(path = %path.display(), entries = seen.len(), "dedup log replayed");

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(SpiderError::io(&path))?;

        Ok(Self {
            path,
            inner: Mutex::new(DedupInner { seen, log }),
        })
    }

    pub async fn seen(&self, id: &str) -> bool {
        self.inner.lock().await.seen.contains(id)
    }

    /// Admits `id`. Returns `Ok(true)` if it was new, `Ok(false)` if it had
    /// already been marked.
    pub async fn mark(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        if inner.seen.contains(id) {
            return Ok(false);
        }

        let line = format!("{}\n", id);
        inner
            .log
            .write_all(line.as_bytes())
            .await
            .map_err(SpiderError::io(&self.path))?;
        inner.log.flush().await.map_err(SpiderError::io(&self.path))?;

        inner.seen.insert(id.to_string());
        Ok(true)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.seen.len()
    }
}

// Reads the log line by line. A missing file is an empty set.
async fn replay(path: &Path) -> Result<HashSet<String>> {
    let mut seen = HashSet::new();

    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(seen),
        Err(e) => return Err(SpiderError::io(path)(e)),
    };

    let mut lines = BufReader::new(file).lines();
    while let Some(line) = lines.next_line().await.map_err(SpiderError::io(path))? {
        let line = line.trim();
        if !line.is_empty() {
            seen.insert(line.to_string());
        }
    }

    Ok(seen)
}
