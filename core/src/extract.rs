//! Structured plain-text rendering of a saved page.
//!
//! ```text
//! #Page title
//!
//! #Heading#
//!
//! Paragraph text
//!
//! - list item
//! ```
//! The `#` around headings is the sentinel the query booster looks for.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

pub const HEADING_SENTINEL: char = '#';

lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").expect("valid selector");
    static ref BLOCKS: Selector =
        Selector::parse("h1, h2, h3, h4, h5, h6, p, li").expect("valid selector");
}

/// Text of an element with every text node trimmed and concatenated.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|s| !s.is_empty()).collect()
}

pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut content: Vec<String> = Vec::new();

    if let Some(title) = doc.select(&TITLE).next() {
        let title = stripped_text(title);
        if !title.is_empty() {
            content.push(format!("{HEADING_SENTINEL}{title}"));
        }
    }

    for el in doc.select(&BLOCKS) {
        let text = stripped_text(el);
        match el.value().name() {
            "p" => {
                if !text.is_empty() {
                    content.push(text);
                }
            }
            "li" => content.push(format!("- {text}")),
            _ => content.push(format!("{HEADING_SENTINEL}{text}{HEADING_SENTINEL}")),
        }
    }

    content.join("\n\n").nfkc().collect()
}

pub fn extract_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(extract_text(&String::from_utf8_lossy(&bytes)))
}
