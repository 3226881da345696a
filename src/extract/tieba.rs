// src/extract/tieba.rs
// =============================================================================
// Baidu Tieba posts: https://tieba.baidu.com/p/<id>, pages via ?pn=<n>.
//
// A post page lists floors (replies); each floor's text lives in
// div.d_post_content inside div.d_post_content_main. The pager ul.l_posts_num
// links every page as ...?pn=<n>, the last one being the highest.
//
// Removed posts don't 404: they render a banner, which classify() maps to a
// TerminalState.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::text::{element_text, first_text, selector};
use super::{Extractor, TerminalState};

static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static H3: Lazy<Selector> = Lazy::new(|| selector("h3"));
static FLOOR: Lazy<Selector> = Lazy::new(|| selector("div.d_post_content_main"));
static FLOOR_TEXT: Lazy<Selector> = Lazy::new(|| selector("div.d_post_content"));
static PAGER: Lazy<Selector> = Lazy::new(|| selector("ul.l_posts_num"));
static PAGE_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"pn=(\d+)").unwrap());
static FIRST_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S.+").unwrap());

const DELETED: &str = "很抱歉，该贴已被删除。";
const MERGED: &str = "该吧被合并您所访问的贴子无法显示";
const HIDDEN: &str = "抱歉，您访问的贴子被隐藏，暂时无法访问。";

pub struct TiebaExtractor;

impl Extractor for TiebaExtractor {
    fn site(&self) -> &'static str {
        "tieba"
    }

    fn title(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        first_text(&document, &[&H1, &H3])
    }

    fn content(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut content = String::new();
        for floor in document.select(&FLOOR) {
            let Some(body) = floor.select(&FLOOR_TEXT).next() else {
                continue;
            };
            let text = element_text(body);
            if let Some(line) = FIRST_LINE.find(&text) {
                content.push_str(line.as_str().trim_end());
                content.push_str("\n\n");
            }
        }
        content
    }

    fn classify(&self, html: &str) -> Option<TerminalState> {
        if html.contains(DELETED) {
            Some(TerminalState::Deleted)
        } else if html.contains(MERGED) {
            Some(TerminalState::Merged)
        } else if html.contains(HIDDEN) {
            Some(TerminalState::Hidden)
        } else {
            None
        }
    }

    fn page_count(&self, html: &str) -> u32 {
        let document = Html::parse_document(html);
        let Some(pager) = document.select(&PAGER).next() else {
            return 1;
        };
        PAGE_PARAM
            .captures_iter(&pager.html())
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .max()
            .unwrap_or(1)
            .max(1)
    }

    fn page_url(&self, item_url: &str, page: u32) -> String {
        format!("{}?pn={}", item_url, page)
    }
}
