// src/extract/text.rs
// Text helpers shared by the site extractors.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Concatenated text of an element and its descendants.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Text of the first element matching any of `selectors`, in order.
pub fn first_text(document: &Html, selectors: &[&Selector]) -> String {
    selectors
        .iter()
        .find_map(|sel| document.select(sel).next())
        .map(|el| element_text(el).trim().to_string())
        .unwrap_or_default()
}

/// Text of an element, leaving out anything nested inside `excluded` tags
/// (quoted replies, signatures).
pub fn text_excluding(element: ElementRef<'_>, excluded: &[&str]) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| excluded.contains(&el.name()))
        });
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

/// Strips markup from an HTML fragment.
pub fn remove_html_tags(fragment: &str) -> String {
    TAG.replace_all(fragment, "").into_owned()
}
