// src/extract/links.rs
// =============================================================================
// Extracts crawlable links from HTML pages.
//
// We use the `scraper` crate to find every <a href>, and the `url` crate to
// resolve relative hrefs against the page they were found on. Fragments are
// dropped so `/a#top` and `/a` count as the same page.
//
// Site extractors filter the result further (same host, path prefix, ...).
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

// Extracts all links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   page_url: the URL of the page (for resolving relative links)
//
// Returns: absolute http(s) URLs in document order, duplicates included
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   page_url = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_html_links(html: &str, page_url: &str) -> Vec<String> {
    let base = match Url::parse(page_url) {
        Ok(url) => url,
        Err(e) => {
            debug!(page_url, error = %e, "cannot resolve links against invalid page url");
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_url(&base, href))
        .collect()
}

// Resolves a possibly-relative href to an absolute crawlable URL
//
// Examples:
//   base = "https://example.com/page"
//   href = "/docs" -> Some("https://example.com/docs")
//   href = "../other#x" -> Some("https://example.com/other")
//   href = "javascript:void(0)" -> None
fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !is_crawlable(&url) {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

fn is_crawlable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
