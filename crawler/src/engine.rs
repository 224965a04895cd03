use crate::fetch::Fetcher;
use crate::links::extract_links;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use scraper::Html;
use sift_core::layout::{self, PAGE_FILE};
use sift_core::persist::{load_crawl_snapshot, save_crawl_snapshot, DomainPaths};
use sift_core::{CrawlSnapshot, UrlRecord};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use url::Url;

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub max_depth: u32,
    pub max_workers: usize,
    /// Pause after each collected fetch result.
    pub politeness_delay: Duration,
    /// Stop after this many completed rounds; the next call resumes.
    pub max_rounds: Option<usize>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self { max_depth: 32, max_workers: 6, politeness_delay: Duration::from_millis(100), max_rounds: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub rounds: usize,
    pub fetched: usize,
    pub visited: usize,
    pub frontier: usize,
}

/// Frontier and visited set. Shared with workers behind one mutex; a URL is
/// never in both.
#[derive(Debug, Default)]
pub struct CrawlState {
    frontier: VecDeque<UrlRecord>,
    visited: HashSet<String>,
}

impl CrawlState {
    pub fn from_snapshot(snapshot: CrawlSnapshot) -> Self {
        let visited: HashSet<String> = snapshot.visited.into_iter().collect();
        let mut state = Self { frontier: VecDeque::new(), visited };
        state.enqueue(snapshot.frontier);
        state
    }

    pub fn snapshot(&self) -> CrawlSnapshot {
        let mut visited: Vec<String> = self.visited.iter().cloned().collect();
        visited.sort();
        CrawlSnapshot { visited, frontier: self.frontier.iter().cloned().collect() }
    }

    /// Check-and-mark: true when the caller now owns this URL's fetch.
    pub fn try_visit(&mut self, record: &UrlRecord, max_depth: u32) -> bool {
        if record.depth > max_depth || self.visited.contains(&record.url) {
            return false;
        }
        self.visited.insert(record.url.clone())
    }

    pub fn is_visited(&self, url: &str) -> bool { self.visited.contains(url) }

    /// Appends records that are neither visited nor already queued.
    pub fn enqueue(&mut self, records: impl IntoIterator<Item = UrlRecord>) {
        let mut queued: HashSet<String> = self.frontier.iter().map(|r| r.url.clone()).collect();
        for r in records {
            if self.visited.contains(&r.url) || !queued.insert(r.url.clone()) {
                continue;
            }
            self.frontier.push_back(r);
        }
    }

    pub fn take_round(&mut self) -> Vec<UrlRecord> { self.frontier.drain(..).collect() }

    pub fn visited_len(&self) -> usize { self.visited.len() }
    pub fn frontier_len(&self) -> usize { self.frontier.len() }
}

#[derive(Debug, Default)]
struct Outcome {
    saved: bool,
    links: Vec<UrlRecord>,
}

struct Worker {
    fetcher: Fetcher,
    state: Arc<Mutex<CrawlState>>,
    domain: String,
    storage_root: PathBuf,
    max_depth: u32,
}

impl Worker {
    async fn process(self: Arc<Self>, record: UrlRecord) -> Outcome {
        if !self.state.lock().try_visit(&record, self.max_depth) {
            return Outcome::default();
        }
        let body = match self.fetcher.fetch(&record.url).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(url = %record.url, error = %e, "fetch failed");
                return Outcome::default();
            }
        };
        let page = match Url::parse(&record.url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(url = %record.url, error = %e, "unparseable url");
                return Outcome::default();
            }
        };
        let saved = match self.save_page(&page, &body) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(url = %record.url, error = %e, "saving page failed");
                false
            }
        };
        if record.depth >= self.max_depth {
            return Outcome { saved, links: Vec::new() };
        }

        let found = {
            let doc = Html::parse_document(&body);
            extract_links(&doc, &page, &self.domain)
        };
        let state = self.state.lock();
        let links = found
            .into_iter()
            .filter(|u| !state.is_visited(u))
            .map(|u| UrlRecord::new(u, record.depth + 1))
            .collect();
        Outcome { saved, links }
    }

    fn save_page(&self, page: &Url, body: &str) -> Result<()> {
        let dir = layout::page_dir(&self.storage_root, page)?;
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(PAGE_FILE), body)?;
        Ok(())
    }
}

pub struct Crawler {
    fetcher: Fetcher,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(fetcher: Fetcher, options: CrawlOptions) -> Self {
        Self { fetcher, options }
    }

    /// Round-based BFS from `seed`, restricted to URLs starting with `domain`.
    /// Resumes from the domain's snapshot when one exists; a finished crawl is
    /// a no-op.
    pub async fn crawl(&self, seed: &str, domain: &str, storage_root: &Path) -> Result<CrawlReport> {
        let seed = Url::parse(seed).with_context(|| format!("invalid seed url {seed}"))?.to_string();
        let paths = DomainPaths::new(layout::domain_dir(storage_root, domain)?);

        let mut state = match load_crawl_snapshot(&paths.crawl_state())? {
            Some(snapshot) => {
                tracing::info!(domain, visited = snapshot.visited.len(), frontier = snapshot.frontier.len(), "resuming crawl");
                CrawlState::from_snapshot(snapshot)
            }
            None => CrawlState::default(),
        };
        if state.frontier_len() == 0 && !state.is_visited(&seed) {
            state.enqueue([UrlRecord::new(seed, 0)]);
        }

        let state = Arc::new(Mutex::new(state));
        let worker = Arc::new(Worker {
            fetcher: self.fetcher.clone(),
            state: state.clone(),
            domain: domain.to_string(),
            storage_root: storage_root.to_path_buf(),
            max_depth: self.options.max_depth,
        });
        let max_workers = self.options.max_workers.max(1);
        let mut report = CrawlReport::default();

        loop {
            let round = state.lock().take_round();
            if round.is_empty() {
                break;
            }
            let dispatched = round.len();
            let mut pending = round.into_iter();
            let mut tasks = JoinSet::new();
            let mut discovered = Vec::new();

            loop {
                while tasks.len() < max_workers {
                    match pending.next() {
                        Some(record) => {
                            tasks.spawn(worker.clone().process(record));
                        }
                        None => break,
                    }
                }
                let Some(joined) = tasks.join_next().await else { break };
                match joined {
                    Ok(outcome) => {
                        if outcome.saved {
                            report.fetched += 1;
                        }
                        discovered.extend(outcome.links);
                    }
                    Err(e) => tracing::warn!(error = %e, "crawl task failed"),
                }
                sleep(self.options.politeness_delay).await;
            }

            let snapshot = {
                let mut s = state.lock();
                s.enqueue(discovered);
                s.snapshot()
            };
            save_crawl_snapshot(&paths.crawl_state(), &snapshot)?;
            report.rounds += 1;
            tracing::info!(
                domain,
                round = report.rounds,
                dispatched,
                visited = snapshot.visited.len(),
                frontier = snapshot.frontier.len(),
                "round complete"
            );
            if self.options.max_rounds.is_some_and(|max| report.rounds >= max) {
                break;
            }
        }

        let s = state.lock();
        report.visited = s.visited_len();
        report.frontier = s.frontier_len();
        Ok(report)
    }
}
