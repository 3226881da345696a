// src/engine/testing.rs
// In-memory fetcher and extractor used by the engine tests.
//
// FakeExtractor understands a tiny markup instead of real HTML:
//   <title>..</title> <content>..</content> <pages>N</pages>
//   <link>..</link> (repeatable) <terminal>deleted|merged|hidden|paywalled</terminal>
//   <panic/> makes content() panic
// Item URLs ending in /book/<n> are keyed by <n>.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::{Extractor, TerminalState};
use crate::fetch::PageFetcher;

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<title>(.*?)</title>").unwrap());
static CONTENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<content>(.*?)</content>").unwrap());
static PAGES: Lazy<Regex> = Lazy::new(|| Regex::new(r"<pages>(\d+)</pages>").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"<link>(.*?)</link>").unwrap());
static TERMINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"<terminal>(\w+)</terminal>").unwrap());
static BOOK_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"/book/(\d+)$").unwrap());

#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    // Remaining failures before a page is served
    failures: Mutex<HashMap<String, usize>>,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    /// Makes the first `times` fetches of `url` fail.
    pub fn failing_first(self, url: &str, times: usize) -> Self {
        self.failures.lock().unwrap().insert(url.to_string(), times);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(left) = self.failures.lock().unwrap().get_mut(url) {
            if *left > 0 {
                *left -= 1;
                return None;
            }
        }
        self.pages.get(url).filter(|body| !body.is_empty()).cloned()
    }
}

pub struct FakeExtractor {
    separator: &'static str,
    requires_title: bool,
}

impl Default for FakeExtractor {
    fn default() -> Self {
        Self {
            separator: "",
            requires_title: true,
        }
    }
}

impl FakeExtractor {
    pub fn with_separator(mut self, separator: &'static str) -> Self {
        self.separator = separator;
        self
    }

    pub fn title_optional(mut self) -> Self {
        self.requires_title = false;
        self
    }
}

fn capture(re: &Regex, html: &str) -> String {
    re.captures(html)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

impl Extractor for FakeExtractor {
    fn site(&self) -> &'static str {
        "fake"
    }

    fn title(&self, html: &str) -> String {
        capture(&TITLE, html)
    }

    fn content(&self, html: &str) -> String {
        if html.contains("<panic/>") {
            panic!("extractor blew up");
        }
        capture(&CONTENT, html)
    }

    fn classify(&self, html: &str) -> Option<TerminalState> {
        match capture(&TERMINAL, html).as_str() {
            "deleted" => Some(TerminalState::Deleted),
            "merged" => Some(TerminalState::Merged),
            "hidden" => Some(TerminalState::Hidden),
            "paywalled" => Some(TerminalState::Paywalled),
            _ => None,
        }
    }

    fn links(&self, _page_url: &str, html: &str) -> Vec<String> {
        LINK.captures_iter(html)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    fn item_id(&self, item_url: &str) -> Option<u64> {
        capture(&BOOK_KEY, item_url).parse().ok()
    }

    fn page_count(&self, html: &str) -> u32 {
        capture(&PAGES, html).parse().unwrap_or(1)
    }

    fn page_url(&self, item_url: &str, page: u32) -> String {
        format!("{}?pn={}", item_url, page)
    }

    fn page_separator(&self) -> &'static str {
        self.separator
    }

    fn requires_title(&self) -> bool {
        self.requires_title
    }
}
