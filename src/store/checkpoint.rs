// src/store/checkpoint.rs
// =============================================================================
// Persists the Sequential-ID cursor: the next ID that has not been handed out.
//
// File format: a single decimal integer, no trailing data required.
//
// Saves go through a sibling temp file and a rename, so a crash mid-write
// leaves either the old cursor or the new one, never a truncated number.
// =============================================================================

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{Result, SpiderError};

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the cursor. Returns `None` if no checkpoint has been written yet.
    pub async fn load(&self) -> Result<Option<u64>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SpiderError::io(&self.path)(e)),
        };

        contents
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| SpiderError::CorruptCheckpoint {
                path: self.path.clone(),
                contents,
            })
    }

    /// Reads the cursor, writing `start` first if this is the first run.
    pub async fn load_or_init(&self, start: u64) -> Result<u64> {
        match self.load().await? {
            Some(cursor) => Ok(cursor),
            None => {
                info!(path = %self.path.display(), start, "initializing checkpoint");
                self.save(start).await?;
                Ok(start)
            }
        }
    }

    pub async fn save(&self, cursor: u64) -> Result<()> {
        let tmp = self.path.with_extension("tmp");

        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(SpiderError::io(&tmp))?;
        file.write_all(cursor.to_string().as_bytes())
            .await
            .map_err(SpiderError::io(&tmp))?;
        file.sync_all().await.map_err(SpiderError::io(&tmp))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(SpiderError::io(&self.path))
    }
}
