use lazy_static::lazy_static;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

lazy_static! {
    static ref ANCHORS: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Paths that look like content pages: `.html`, `.htm`, a trailing slash,
/// or no file extension anywhere in the path.
pub fn is_content_path(path: &str) -> bool {
    path.ends_with(".html") || path.ends_with(".htm") || path.ends_with('/') || !path.contains('.')
}

/// Resolves `href` against the page, drops the fragment, and keeps it only when
/// it is an http(s) content page under `domain`.
pub fn resolve_link(page: &Url, href: &str, domain: &str) -> Option<Url> {
    let mut u = page.join(href.trim()).ok()?;
    u.set_fragment(None);
    if !matches!(u.scheme(), "http" | "https") { return None; }
    if !u.as_str().starts_with(domain) { return None; }
    if !is_content_path(u.path()) { return None; }
    Some(u)
}

pub fn extract_links(doc: &Html, page: &Url, domain: &str) -> BTreeSet<String> {
    doc.select(&ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(page, href, domain))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "https://lab.example.org";

    fn page() -> Url {
        Url::parse("https://lab.example.org/news/").unwrap()
    }

    #[test]
    fn keeps_same_domain_content_pages() {
        let html = Html::parse_document(
            r##"<a href="2024.html#top">a</a>
               <a href="/people/">b</a>
               <a href="//lab.example.org/about">c</a>
               <a href="https://other.org/x.html">d</a>
               <a href="/files/report.pdf">e</a>
               <a href="mailto:someone@lab.example.org">f</a>
               <a href="#only-fragment">g</a>"##,
        );
        let links = extract_links(&html, &page(), DOMAIN);
        let expected: BTreeSet<String> = [
            "https://lab.example.org/news/2024.html",
            "https://lab.example.org/people/",
            "https://lab.example.org/about",
            "https://lab.example.org/news/",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(links, expected);
    }

    #[test]
    fn content_path_heuristics() {
        assert!(is_content_path("/a/b"));
        assert!(is_content_path("/a/b.htm"));
        assert!(is_content_path("/v1.2/"));
        assert!(!is_content_path("/img/logo.png"));
    }
}
