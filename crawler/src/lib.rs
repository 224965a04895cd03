pub mod engine;
pub mod fetch;
pub mod links;

pub use engine::{CrawlOptions, CrawlReport, CrawlState, Crawler};
pub use fetch::{FetchError, Fetcher};

use anyhow::Result;
use std::path::Path;

/// Crawl with the default fetcher and politeness settings.
pub async fn crawl(
    seed: &str,
    domain: &str,
    storage_root: &Path,
    max_depth: u32,
    max_workers: usize,
) -> Result<CrawlReport> {
    let fetcher = Fetcher::new(fetch::DEFAULT_USER_AGENT, fetch::DEFAULT_TIMEOUT)?;
    let options = CrawlOptions { max_depth, max_workers, ..CrawlOptions::default() };
    Crawler::new(fetcher, options).crawl(seed, domain, storage_root).await
}
