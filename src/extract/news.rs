// src/extract/news.rs
// =============================================================================
// NetEase (163.com) news channels: http://<prefix>.163.com/
//
// Article text is every <p> under div.overview or div.post_text. We follow
// .html links that stay on the channel we started from.
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::links::extract_html_links;
use super::text::{element_text, first_text, selector};
use super::Extractor;

static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1"));
static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| selector("div.overview p, div.post_text p"));

pub struct NewsExtractor {
    channel: String,
}

impl NewsExtractor {
    pub fn new(prefix: &str) -> Self {
        Self {
            channel: format!("http://{}.163.com/", prefix),
        }
    }

    fn on_channel(&self, link: &str) -> bool {
        link.starts_with(&self.channel) && link.ends_with(".html")
    }
}

impl Extractor for NewsExtractor {
    fn site(&self) -> &'static str {
        "news"
    }

    fn title(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        first_text(&document, &[&TITLE])
    }

    fn content(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        document
            .select(&PARAGRAPH)
            .map(|p| element_text(p).trim().to_string())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn links(&self, page_url: &str, html: &str) -> Vec<String> {
        extract_html_links(html, page_url)
            .into_iter()
            .filter(|link| self.on_channel(link))
            .collect()
    }

    fn requires_title(&self) -> bool {
        false
    }
}
