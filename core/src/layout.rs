//! Deterministic mapping between URLs and on-disk page directories.
//!
//! A page at `https://example.org/news/2024/` lives in
//! `<root>/https_example.org/news/2024/index.html`; its document id is the
//! directory relative to the root. Reversing the encoding replaces the first
//! `_` of the id with `://`.

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use url::Url;

use crate::DocId;

pub const PAGE_FILE: &str = "index.html";
pub const CONTENT_FILE: &str = "index_content.txt";
pub const SEGMENTED_FILE: &str = "index_segmented.txt";

lazy_static! {
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9]+").expect("valid regex");
}

/// `scheme_host[:port]/path` with the trailing slash removed.
pub fn doc_id_for_url(url: &Url) -> Result<DocId> {
    let host = url.host_str().ok_or_else(|| anyhow!("url has no host: {url}"))?;
    let mut id = match url.port() {
        Some(port) => format!("{}_{}:{}", url.scheme(), host, port),
        None => format!("{}_{}", url.scheme(), host),
    };
    for segment in url.path().split('/').filter(|s| !s.is_empty()) {
        id.push('/');
        id.push_str(segment);
    }
    Ok(id)
}

pub fn page_dir(root: &Path, url: &Url) -> Result<PathBuf> {
    Ok(doc_dir(root, &doc_id_for_url(url)?))
}

/// Directory of a domain URL string such as `https://example.org`.
pub fn domain_dir(root: &Path, domain: &str) -> Result<PathBuf> {
    let url = Url::parse(domain).map_err(|e| anyhow!("invalid domain {domain}: {e}"))?;
    page_dir(root, &url)
}

pub fn doc_dir(root: &Path, doc: &str) -> PathBuf {
    doc.split('/').fold(root.to_path_buf(), |p, seg| p.join(seg))
}

/// Document id of a page directory below `root`; `None` when it is not below it.
pub fn doc_id_for_dir(root: &Path, dir: &Path) -> Option<DocId> {
    let rel = dir.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() { return None; }
    Some(parts.join("/"))
}

pub fn doc_id_to_url(doc: &str) -> String {
    doc.replacen('_', "://", 1)
}

/// Canonical, order-independent key of a domain set.
pub fn domain_set_key<S: AsRef<str>>(domains: &[S]) -> String {
    let mut sorted: Vec<&str> = domains.iter().map(|d| d.as_ref()).collect();
    sorted.sort_unstable();
    sorted.dedup();
    let joined = sorted.join(" ").to_lowercase();
    NON_SLUG.replace_all(&joined, "-").trim_matches('-').to_string()
}
