// src/extract/tianya.rs
// =============================================================================
// Tianya forum posts: http://bbs.tianya.cn/post-<board>-<id>-<page>.shtml
//
// Replies sit in div.atl-item > div.bbs-content. A reply that quotes another
// user starts with "@name ... <br>", which we strip along with the dashed
// separator lines some users paste in.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::text::{first_text, remove_html_tags, selector};
use super::Extractor;

static TITLE: Lazy<Selector> = Lazy::new(|| selector("span.s_title"));
static REPLY: Lazy<Selector> = Lazy::new(|| selector("div.atl-item div.bbs-content"));
static PAGER: Lazy<Selector> = Lazy::new(|| selector("div.atl-pages"));
static PAGE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/post-[^\s-]+-\d+-(\d+)\.shtml").unwrap());
static QUOTE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[\s\S]+?<br\s*/?>").unwrap());
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{3,}").unwrap());
static FIRST_PAGE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d+\.shtml$").unwrap());

pub struct TianyaExtractor;

impl Extractor for TianyaExtractor {
    fn site(&self) -> &'static str {
        "tianya"
    }

    fn title(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        first_text(&document, &[&TITLE])
    }

    fn content(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut content = String::new();
        for reply in document.select(&REPLY) {
            let inner = reply.inner_html();
            let inner = QUOTE_PREFIX.replace_all(&inner, "");
            let inner = DASHES.replace_all(&inner, "");
            let text = remove_html_tags(&inner);
            let text = text.trim();
            if !text.is_empty() {
                content.push_str(text);
                content.push_str("\n\n");
            }
        }
        content
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
        FIRST_PAGE_SUFFIX
            .replace(item_url, format!("-{}.shtml", page).as_str())
            .into_owned()
    }
}
