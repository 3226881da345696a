// src/extract/novel.rs
// =============================================================================
// 17K novels (www.17k.com).
//
// Three kinds of page flow through the frontier:
// - catalogue pages (the seeds) link to books as book/<n>.html, which we
//   rewrite to the book's chapter index list/<n>.html
// - a chapter index is the item: its title names the book, its number keys
//   the book's output file, and its chapter links are the "sub-pages" the
//   assembler stitches together
// - chapter pages carry the text in div.p, ending with a promo line
//
// VIP books only show chapter stubs and are skipped as paywalled.
// =============================================================================

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::text::{element_text, first_text, selector};
use super::{Extractor, TerminalState};

const BASE: &str = "http://www.17k.com/";
const PROMO: &str = "本书首发来自17K小说网，第一时间看正版内容！";
const VIP_MARKER: &str = "ellipsis vip";

static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1"));
static CHAPTER_TEXT: Lazy<Selector> = Lazy::new(|| selector("div.p"));
static BOOK_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"book/(\d+)\.html").unwrap());
static BOOK_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/list/(\d+)\.html$").unwrap());
static CHAPTER_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"chapter/[^"'\s<>]+?\.html"#).unwrap());

pub struct NovelExtractor;

impl Extractor for NovelExtractor {
    fn site(&self) -> &'static str {
        "novel"
    }

    fn title(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        first_text(&document, &[&TITLE])
    }

    fn content(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut text = String::new();
        for block in document.select(&CHAPTER_TEXT) {
            text.push_str(element_text(block).trim());
        }
        match text.find(PROMO) {
            Some(end) => text[..end].trim().to_string(),
            None => text.trim().to_string(),
        }
    }

    fn classify(&self, html: &str) -> Option<TerminalState> {
        html.contains(VIP_MARKER).then_some(TerminalState::Paywalled)
    }

    fn item_id(&self, item_url: &str) -> Option<u64> {
        BOOK_INDEX.captures(item_url)?[1].parse().ok()
    }

    fn links(&self, _page_url: &str, html: &str) -> Vec<String> {
        unique(
            BOOK_LINK
                .captures_iter(html)
                .map(|caps| format!("{}list/{}.html", BASE, &caps[1])),
        )
    }

    fn sub_pages(&self, _item_url: &str, first_html: &str) -> Vec<String> {
        unique(
            CHAPTER_LINK
                .find_iter(first_html)
                .map(|m| format!("{}{}", BASE, m.as_str())),
        )
    }

    fn page_separator(&self) -> &'static str {
        "\n"
    }

    // Catalogue pages have no h1 but still need their links followed
    fn requires_title(&self) -> bool {
        false
    }
}

// Keeps first occurrences, in order
fn unique(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}
