// src/error.rs
// =============================================================================
// Error types shared by the stores, the frontiers and the worker pool.
//
// The binary boundary (main.rs) wraps these in anyhow for context. Inside the
// engine we keep a concrete enum so the worker loop can classify failures
// instead of just printing them.
// =============================================================================

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the crawl engine.
#[derive(Debug, Error)]
pub enum SpiderError {
    /// A persisted file (checkpoint, log, output) could not be read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The checkpoint file exists but does not hold a single integer
    #[error("corrupt checkpoint {}: {contents:?}", path.display())]
    CorruptCheckpoint { path: PathBuf, contents: String },

    /// A URL template is missing its `{id}` placeholder
    #[error("invalid url template: {0}")]
    InvalidTemplate(String),

    /// The HTTP client could not be constructed
    #[error("http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// An item attempt panicked or was aborted
    #[error("worker task aborted: {0}")]
    Aborted(String),
}

impl SpiderError {
    // Builds a closure for map_err that tags an io::Error with its path
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> SpiderError + '_ {
        move |source| SpiderError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SpiderError>;
