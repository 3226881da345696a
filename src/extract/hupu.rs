// src/extract/hupu.rs
// =============================================================================
// Hupu BBS threads: https://bbs.hupu.com/<id>.html, pages <id>-<n>.html.
//
// Each reply is a div.quote-content. Quoted replies (blockquote) and the
// device signature (small) are left out, as are leading @mentions.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::text::{first_text, selector, text_excluding};
use super::Extractor;

static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1"));
static REPLY: Lazy<Selector> = Lazy::new(|| selector("div.quote-content"));
static PAGER: Lazy<Selector> = Lazy::new(|| selector("div.page"));
static PAGE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+-(\d+)\.html").unwrap());
static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\S+?\s").unwrap());

pub struct HupuExtractor;

impl Extractor for HupuExtractor {
    fn site(&self) -> &'static str {
        "hupu"
    }

    fn title(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        first_text(&document, &[&TITLE])
    }

    fn content(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        document
            .select(&REPLY)
            .map(|reply| {
                let text = text_excluding(reply, &["blockquote", "small"]);
                MENTION.replace_all(text.trim(), "").trim().to_string()
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn page_count(&self, html: &str) -> u32 {
        let document = Html::parse_document(html);
        let Some(pager) = document.select(&PAGER).next() else {
            return 1;
        };
        PAGE_LINK
            .captures_iter(&pager.html())
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .max()
            .unwrap_or(1)
            .max(1)
    }

    fn page_url(&self, item_url: &str, page: u32) -> String {
        let stem = item_url.strip_suffix(".html").unwrap_or(item_url);
        format!("{}-{}.html", stem, page)
    }

    fn page_separator(&self) -> &'static str {
        "\n\n"
    }
}
