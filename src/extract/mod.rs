// src/extract/mod.rs
// =============================================================================
// Site-specific content extraction.
//
// The engine is the same for every site; what differs is how a page's title,
// body text, outbound links and pagination are found. Each site implements
// the Extractor trait and the worker pool calls it as a set of pure
// functions on the fetched HTML.
//
// Submodules:
// - text: small helpers shared by the site extractors
// - links: resolving <a href> values into absolute crawlable URLs
// - tieba, tianya, hupu: forum posts addressed by sequential ID
// - baike, news, novel: link-discovery sites
// =============================================================================

mod baike;
mod hupu;
mod links;
mod news;
mod novel;
mod text;
mod tianya;
mod tieba;

use std::sync::Arc;

use serde::Serialize;

use crate::config::SiteKind;

pub use baike::BaikeExtractor;
pub use hupu::HupuExtractor;
pub use news::NewsExtractor;
pub use novel::NovelExtractor;
pub use tianya::TianyaExtractor;
pub use tieba::TiebaExtractor;

/// Expected end states of a page that are not errors: the content exists
/// (or existed) but is not ours to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Deleted,
    Merged,
    Hidden,
    Paywalled,
}

pub trait Extractor: Send + Sync {
    fn site(&self) -> &'static str;

    fn title(&self, html: &str) -> String;

    /// Primary text of one page. Empty if the page has none.
    fn content(&self, html: &str) -> String;

    fn classify(&self, _html: &str) -> Option<TerminalState> {
        None
    }

    /// Stable numeric key for a link item, used to name its per-item file.
    /// Sequential items already carry their ID.
    fn item_id(&self, _item_url: &str) -> Option<u64> {
        None
    }

    /// Absolute URLs worth crawling, for link-discovery sites.
    fn links(&self, _page_url: &str, _html: &str) -> Vec<String> {
        Vec::new()
    }

    /// Number of pages the item spans, read from its first page.
    fn page_count(&self, _html: &str) -> u32 {
        1
    }

    fn page_url(&self, item_url: &str, _page: u32) -> String {
        item_url.to_string()
    }

    /// URLs of pages 2..N, in order.
    fn sub_pages(&self, item_url: &str, first_html: &str) -> Vec<String> {
        (2..=self.page_count(first_html))
            .map(|page| self.page_url(item_url, page))
            .collect()
    }

    /// Inserted between the content of consecutive pages.
    fn page_separator(&self) -> &'static str {
        ""
    }

    /// Whether a page without a title should be skipped.
    fn requires_title(&self) -> bool {
        true
    }
}

pub fn for_site(site: SiteKind, site_arg: &str) -> Arc<dyn Extractor> {
    match site {
        SiteKind::Tieba => Arc::new(TiebaExtractor),
        SiteKind::Tianya => Arc::new(TianyaExtractor),
        SiteKind::Hupu => Arc::new(HupuExtractor),
        SiteKind::Baike => Arc::new(BaikeExtractor),
        SiteKind::News => Arc::new(NewsExtractor::new(site_arg)),
        SiteKind::Novel => Arc::new(NovelExtractor),
    }
}
