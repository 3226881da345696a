// src/fetch/proxy.rs
// =============================================================================
// Proxy list kept fresh by a background task.
//
// Some other process (or a human) maintains a text file with one proxy per
// line, either `host:port` or a full `scheme://host:port` URL. We re-read it
// on a fixed interval and rebuild one reqwest Client per proxy. The fetcher
// picks a random client per attempt.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::Client;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{Result, SpiderError};
use crate::fetch::http::build_client;

pub struct ProxyPool {
    list_file: PathBuf,
    clients: RwLock<Vec<Client>>,
}

impl ProxyPool {
    pub fn new(list_file: impl Into<PathBuf>) -> Self {
        Self {
            list_file: list_file.into(),
            clients: RwLock::new(Vec::new()),
        }
    }

    /// Re-reads the proxy list. Returns how many proxies are now in use.
    pub async fn reload(&self) -> Result<usize> {
        let text = tokio::fs::read_to_string(&self.list_file)
            .await
            .map_err(SpiderError::io(&self.list_file))?;

        let mut clients = Vec::new();
        for line in text.lines() {
            let Some(proxy_url) = normalize(line) else {
                continue;
            };
            match reqwest::Proxy::all(&proxy_url) {
                Ok(proxy) => clients.push(build_client(Some(proxy))?),
                Err(e) => warn!(proxy = %proxy_url, error = %e, "ignoring bad proxy"),
            }
        }

        let count = clients.len();
        *self.clients.write().await = clients;
        Ok(count)
    }

    pub async fn pick(&self) -> Option<Client> {
        let clients = self.clients.read().await;
        clients.choose(&mut rand::thread_rng()).cloned()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Reloads the list every `every` until `cancel` fires.
    pub fn spawn_refresh(
        self: Arc<Self>,
        every: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.reload().await {
                    Ok(count) => info!(count, "proxy list refreshed"),
                    Err(e) => warn!(error = %e, "proxy list refresh failed"),
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(every) => {}
                }
            }
        })
    }
}

fn normalize(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    if line.contains("://") {
        Some(line.to_string())
    } else {
        Some(format!("http://{}", line))
    }
}
