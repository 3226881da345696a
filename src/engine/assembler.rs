// src/engine/assembler.rs
// =============================================================================
// Stitches a multi-page item (a long thread, a book) into one text.
//
// The first page is already fetched by the worker; it tells us which other
// pages exist. Those are fetched one at a time, in order, and their content
// appended with the site's page separator. A sub-page that fails to fetch or
// has no content contributes nothing.
// =============================================================================

use tracing::debug;

use crate::extract::Extractor;
use crate::fetch::PageFetcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub content: String,
    /// Pages the item spans, including the first (always >= 1)
    pub pages: usize,
}

pub struct ContentAssembler<'a> {
    fetcher: &'a dyn PageFetcher,
    extractor: &'a dyn Extractor,
}

impl<'a> ContentAssembler<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, extractor: &'a dyn Extractor) -> Self {
        Self { fetcher, extractor }
    }

    pub async fn assemble(&self, item_url: &str, first_html: &str) -> Assembled {
        let mut content = self.extractor.content(first_html);
        let sub_pages = self.extractor.sub_pages(item_url, first_html);
        let pages = sub_pages.len() + 1;
        let separator = self.extractor.page_separator();

        for page_url in sub_pages {
            let Some(html) = self.fetcher.fetch(&page_url).await else {
                debug!(url = %page_url, "sub-page fetch failed");
                continue;
            };
            let part = self.extractor.content(&html);
            if part.is_empty() {
                continue;
            }
            if !content.is_empty() {
                content.push_str(separator);
            }
            content.push_str(&part);
        }

        Assembled { content, pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FakeExtractor, FakeFetcher};

    #[tokio::test]
    async fn test_single_page_is_first_content_exactly() {
        let fetcher = FakeFetcher::default();
        let extractor = FakeExtractor::default().with_separator("\n\n");
        let assembler = ContentAssembler::new(&fetcher, &extractor);

        let first = "<content>only page\n\n</content>";
        let assembled = assembler.assemble("https://x/p/1", first).await;

        assert_eq!(assembled.content, "only page\n\n");
        assert_eq!(assembled.pages, 1);
    }

    #[tokio::test]
    async fn test_pages_are_joined_in_order() {
        let fetcher = FakeFetcher::default()
            .with_page("https://x/p/1?pn=2", "<content>two</content>")
            .with_page("https://x/p/1?pn=3", "<content>three</content>");
        let extractor = FakeExtractor::default().with_separator("\n\n");
        let assembler = ContentAssembler::new(&fetcher, &extractor);

        let first = "<pages>3</pages><content>one</content>";
        let assembled = assembler.assemble("https://x/p/1", first).await;

        assert_eq!(assembled.content, "one\n\ntwo\n\nthree");
        assert_eq!(assembled.pages, 3);
        assert_eq!(
            fetcher.requested(),
            vec!["https://x/p/1?pn=2", "https://x/p/1?pn=3"]
        );
    }

    #[tokio::test]
    async fn test_empty_and_missing_sub_pages_contribute_nothing() {
        // pn=2 is not served, pn=3 has no content
        let fetcher = FakeFetcher::default()
            .with_page("https://x/p/1?pn=3", "<content></content>")
            .with_page("https://x/p/1?pn=4", "<content>four</content>");
        let extractor = FakeExtractor::default().with_separator("|");
        let assembler = ContentAssembler::new(&fetcher, &extractor);

        let first = "<pages>4</pages><content>one</content>";
        let assembled = assembler.assemble("https://x/p/1", first).await;

        assert_eq!(assembled.content, "one|four");
        assert_eq!(assembled.pages, 4);
    }

    #[tokio::test]
    async fn test_empty_first_page_gets_no_leading_separator() {
        let fetcher = FakeFetcher::default().with_page("https://x/p/1?pn=2", "<content>two</content>");
        let extractor = FakeExtractor::default().with_separator("\n");
        let assembler = ContentAssembler::new(&fetcher, &extractor);

        let assembled = assembler
            .assemble("https://x/p/1", "<pages>2</pages><content></content>")
            .await;
        assert_eq!(assembled.content, "two");
    }
}
