//! Crawl, build and query for a set of domains.
//!
//! A domain set is built once: its combined space is recorded in
//! `history/history.json` under the set's key and reused by later queries.

use anyhow::{bail, Result};
use parking_lot::RwLock;
use serde::Serialize;
use sift_core::layout::{self, doc_id_to_url, domain_set_key};
use sift_core::persist::{load_combined, CombinedPaths, StoragePaths};
use sift_core::query::{BoosterConfig, QueryEngine};
use sift_core::status::History;
use sift_core::tfidf::CombinedSpace;
use sift_core::tokenizer::{Segmenter, Stopwords};
use sift_crawler::fetch::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use sift_crawler::{CrawlOptions, Crawler, Fetcher};
use sift_indexer::{build_domain, combine_domains};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_TOP_K: usize = 60;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub storage_root: PathBuf,
    /// Directory of `*.txt` stopword lists; the built-in list when `None`.
    pub stopwords: Option<PathBuf>,
    pub crawl: CrawlOptions,
    pub booster: BoosterConfig,
}

impl PipelineConfig {
    pub fn new<P: AsRef<Path>>(storage_root: P) -> Self {
        Self {
            storage_root: storage_root.as_ref().to_path_buf(),
            stopwords: None,
            crawl: CrawlOptions::default(),
            booster: BoosterConfig::default(),
        }
    }
}

/// One ranked hit: where the page lives on disk and the URL it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub path: PathBuf,
    pub url: String,
}

pub struct Pipeline {
    config: PipelineConfig,
    storage: StoragePaths,
    segmenter: Arc<Segmenter>,
    fetcher: Fetcher,
    spaces: RwLock<HashMap<String, Arc<CombinedSpace>>>,
    // Builds touch build.json and history.json; one at a time.
    build_lock: tokio::sync::Mutex<()>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let stopwords = Stopwords::from_source(config.stopwords.as_deref())?;
        let fetcher = Fetcher::new(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)?;
        Ok(Self {
            storage: StoragePaths::new(&config.storage_root),
            segmenter: Arc::new(Segmenter::new(stopwords)),
            fetcher,
            spaces: RwLock::new(HashMap::new()),
            build_lock: tokio::sync::Mutex::new(()),
            config,
        })
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Ranked results for `query` over `domains`, crawling and building the
    /// domain set first when history has no usable entry for it.
    pub async fn run(&self, seeds: &[String], domains: &[String], query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let mut domains = domains.to_vec();
        domains.sort();
        domains.dedup();
        if domains.is_empty() {
            bail!("no domains given");
        }
        let key = domain_set_key(&domains);
        let combined = self.ensure_built(seeds, &domains, &key).await?;
        let space = self.space(&key, combined).await?;

        let segmenter = self.segmenter.clone();
        let root = self.storage.root.clone();
        let booster = self.config.booster.clone();
        let q = query.to_string();
        let docs = tokio::task::spawn_blocking(move || {
            QueryEngine::new(&segmenter, &space, root).with_booster(booster).search(&q, top_k)
        })
        .await?;

        tracing::info!(key = %key, query, results = docs.len(), "query answered");
        Ok(docs
            .into_iter()
            .map(|doc| SearchResult { path: layout::doc_dir(&self.storage.root, &doc), url: doc_id_to_url(&doc) })
            .collect())
    }

    async fn ensure_built(&self, seeds: &[String], domains: &[String], key: &str) -> Result<CombinedPaths> {
        let _guard = self.build_lock.lock().await;
        let history = History::load(&self.storage.history())?;
        if let Some(entry) = history.lookup(key) {
            let paths = CombinedPaths::new(&entry.dict_path);
            if paths.exists() {
                tracing::debug!(key, built = %entry.time, "domain set already built");
                return Ok(paths);
            }
            tracing::warn!(key, dir = %paths.root.display(), "history entry without artifacts, rebuilding");
        }

        let domain_paths = domains.iter().map(|d| self.storage.domain(d)).collect::<Result<Vec<_>>>()?;
        let crawler = Crawler::new(self.fetcher.clone(), self.config.crawl.clone());
        for domain in domains {
            let seed = seed_for(seeds, domain);
            let report = crawler.crawl(seed, domain, &self.storage.root).await?;
            tracing::info!(domain = %domain, seed, fetched = report.fetched, visited = report.visited, "crawl finished");

            let storage = self.storage.clone();
            let segmenter = self.segmenter.clone();
            let domain = domain.clone();
            tokio::task::spawn_blocking(move || build_domain(&storage, &domain, &segmenter)).await??;
        }

        let out = self.storage.combined(key);
        let target = out.clone();
        tokio::task::spawn_blocking(move || combine_domains(&domain_paths, &target)).await??;
        History::load(&self.storage.history())?.record(key, &out.root)?;
        self.spaces.write().remove(key);
        tracing::info!(key, dir = %out.root.display(), "domain set built");
        Ok(out)
    }

    async fn space(&self, key: &str, paths: CombinedPaths) -> Result<Arc<CombinedSpace>> {
        let cached = self.spaces.read().get(key).cloned();
        if let Some(space) = cached {
            return Ok(space);
        }
        let space = Arc::new(tokio::task::spawn_blocking(move || load_combined(&paths)).await??);
        self.spaces.write().insert(key.to_string(), space.clone());
        tracing::debug!(key, docs = space.vectors.len(), "combined space loaded");
        Ok(space)
    }

    /// Number of combined spaces held in memory.
    pub fn cached_spaces(&self) -> usize {
        self.spaces.read().len()
    }
}

/// First seed that lies inside `domain`, else the domain itself.
fn seed_for<'a>(seeds: &'a [String], domain: &'a str) -> &'a str {
    seeds.iter().find(|s| s.starts_with(domain)).map(String::as_str).unwrap_or(domain)
}

/// One-shot pipeline run with default crawl and booster settings.
pub async fn run_pipeline(
    seeds: &[String],
    domains: &[String],
    storage_root: &Path,
    stopwords: Option<&Path>,
    query: &str,
    top_k: usize,
) -> Result<Vec<SearchResult>> {
    let mut config = PipelineConfig::new(storage_root);
    config.stopwords = stopwords.map(Path::to_path_buf);
    Pipeline::new(config)?.run(seeds, domains, query, top_k).await
}
