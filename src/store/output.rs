// src/store/output.rs
// =============================================================================
// Writes assembled item content to its three optional destinations:
//
//   small file    <ns>_output/<bucket>/<id>_<title>.txt  (one per item)
//   aggregate     <ns>_all.txt                           (every item appended)
//   deduplicated  <ns>_dedu.txt                          (each distinct text once)
//
// Each shared destination has its own lock so appends from different workers
// never interleave. Small files need no lock: every item owns its own path.
//
// A text's fingerprint is recorded only after its deduplicated append
// succeeded, while that file's lock is held. A failed append leaves the text
// eligible for the next item that carries it.
// =============================================================================

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::{OutputFlags, StateLayout};
use crate::error::{Result, SpiderError};
use crate::store::DedupStore;

// Common file systems cap a name at 255 bytes; this leaves room for the
// "<id>_" prefix and ".txt"
const TITLE_BYTES: usize = 200;

// Characters that are unsafe or awkward in file names
static UNSAFE_TITLE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\ |:*<>?'"]"#).expect("static regex"));

struct AppendFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl AppendFile {
    async fn open(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(SpiderError::io(&path))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    async fn append(&self, record: &str) -> Result<()> {
        let mut file = self.file.lock().await;
        write_record(&mut file, &self.path, record).await
    }
}

async fn write_record(file: &mut File, path: &Path, record: &str) -> Result<()> {
    file.write_all(record.as_bytes())
        .await
        .map_err(SpiderError::io(path))?;
    file.flush().await.map_err(SpiderError::io(path))
}

/// Append-only file that takes each distinct text once.
struct DistinctFile {
    fingerprints: DedupStore,
    out: AppendFile,
}

impl DistinctFile {
    /// Appends `record` unless `content` was written before. Returns whether
    /// it was appended.
    async fn append(&self, content: &str, record: &str) -> Result<bool> {
        let key = fingerprint(content);
        let mut file = self.out.file.lock().await;
        if self.fingerprints.seen(&key).await {
            return Ok(false);
        }
        write_record(&mut file, &self.out.path, record).await?;
        self.fingerprints.mark(&key).await
    }
}

pub struct OutputSink {
    items_dir: Option<PathBuf>,
    aggregate: Option<AppendFile>,
    deduplicated: Option<DistinctFile>,
}

impl OutputSink {
    pub async fn open(layout: &StateLayout, flags: OutputFlags) -> Result<Self> {
        let items_dir = if flags.small_files {
            let dir = layout.items_dir();
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(SpiderError::io(&dir))?;
            Some(dir)
        } else {
            None
        };

        let aggregate = if flags.aggregate {
            Some(AppendFile::open(layout.aggregate_file()).await?)
        } else {
            None
        };

        let deduplicated = if flags.deduplicated {
            Some(DistinctFile {
                fingerprints: DedupStore::open(layout.dedup_fingerprints()).await?,
                out: AppendFile::open(layout.dedup_file()).await?,
            })
        } else {
            None
        };

        Ok(Self {
            items_dir,
            aggregate,
            deduplicated,
        })
    }

    /// Writes one item. Items without an `id` (link items the site can't
    /// key) go to the aggregate destinations alone.
    pub async fn write(&self, id: Option<u64>, title: &str, content: &str) -> Result<()> {
        if let (Some(dir), Some(id)) = (&self.items_dir, id) {
            let path = item_path(dir, id, title);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(SpiderError::io(parent))?;
            }
            tokio::fs::write(&path, content)
                .await
                .map_err(SpiderError::io(&path))?;
        }

        let record = format!("{}\n\n", content.trim_end());

        if let Some(aggregate) = &self.aggregate {
            aggregate.append(&record).await?;
        }

        if let Some(distinct) = &self.deduplicated {
            distinct.append(content, &record).await?;
        }

        Ok(())
    }
}

/// Directory bucket for an ID: the decimal ID without its last 4 digits.
pub fn bucket_for(id: u64) -> String {
    let digits = id.to_string();
    if digits.len() <= 4 {
        "0".to_string()
    } else {
        digits[..digits.len() - 4].to_string()
    }
}

pub fn sanitize_title(title: &str) -> String {
    let safe = UNSAFE_TITLE_CHARS.replace_all(title.trim(), "_");
    let mut end = safe.len().min(TITLE_BYTES);
    while !safe.is_char_boundary(end) {
        end -= 1;
    }
    safe[..end].to_string()
}

pub fn item_path(items_dir: &Path, id: u64, title: &str) -> PathBuf {
    items_dir
        .join(bucket_for(id))
        .join(format!("{}_{}.txt", id, sanitize_title(title)))
}

fn fingerprint(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.trim().as_bytes()))
}
