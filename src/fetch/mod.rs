// src/fetch/mod.rs
// =============================================================================
// Page fetching: the engine only needs "URL in, HTML out (or nothing)".
//
// Submodules:
// - http: the reqwest-backed fetcher with retries
// - proxy: a proxy list that is reloaded from disk in the background
//
// Retrying and proxy selection happen inside the fetcher. The engine treats
// `None` as "skip this item"; it never retries on its own.
// =============================================================================

mod http;
mod proxy;

use async_trait::async_trait;

pub use http::HttpFetcher;
pub use proxy::ProxyPool;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page body, or `None` if the page could not be fetched.
    async fn fetch(&self, url: &str) -> Option<String>;
}
