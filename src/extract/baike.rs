// src/extract/baike.rs
// =============================================================================
// Baidu Baike entries, crawled breadth-first from the home page.
//
// Entry text is the sequence of div.para paragraphs, each on its own line,
// with citation markers like [1] or [2-3] removed. Only /item/ links on the
// Baike host are followed.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::links::extract_html_links;
use super::text::{element_text, first_text, selector};
use super::Extractor;

const HOST: &str = "baike.baidu.com";

static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1"));
static PARA: Lazy<Selector> = Lazy::new(|| selector("div.para"));
static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+(-\d+)?\]").unwrap());

pub struct BaikeExtractor;

impl Extractor for BaikeExtractor {
    fn site(&self) -> &'static str {
        "baike"
    }

    fn title(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        first_text(&document, &[&TITLE])
    }

    fn content(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut content = String::new();
        for para in document.select(&PARA) {
            let text = element_text(para).replace('\n', "");
            let text = CITATION.replace_all(&text, "");
            let text = text.trim();
            if !text.is_empty() {
                content.push('\n');
                content.push_str(text);
            }
        }
        content
    }

    fn links(&self, page_url: &str, html: &str) -> Vec<String> {
        extract_html_links(html, page_url)
            .into_iter()
            .filter_map(|link| {
                let mut url = Url::parse(&link).ok()?;
                if url.host_str() != Some(HOST) || !url.path().starts_with("/item/") {
                    return None;
                }
                // ?fromModule=... variants are the same entry
                url.set_query(None);
                Some(url.to_string())
            })
            .collect()
    }

    fn requires_title(&self) -> bool {
        false
    }
}
