//! Query-time ranking: cosine similarity against the combined vector space,
//! then a lexical re-rank of the top candidates that rewards literal term and
//! phrase matches close to a heading sentinel.

use crate::extract::HEADING_SENTINEL;
use crate::index::count_occurrences;
use crate::layout::{self, CONTENT_FILE};
use crate::tfidf::{idf, log_tf, CombinedSpace};
use crate::tokenizer::{SegmentMode, Segmenter};
use crate::{DocId, InvertedIndex, TermVector, VectorSpace};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone)]
pub struct BoosterConfig {
    /// Characters on either side of a match searched for the sentinel.
    pub radius: usize,
    pub sentinel: char,
    pub max_results: usize,
    pub term_exponent: u32,
    pub term_near_heading_exponent: u32,
    pub phrase_exponent: u32,
    pub phrase_near_heading_exponent: u32,
    /// Documents whose id contains this marker are directory index pages.
    pub excluded_marker: String,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self {
            radius: 7,
            sentinel: HEADING_SENTINEL,
            max_results: 21,
            term_exponent: 2,
            term_near_heading_exponent: 3,
            phrase_exponent: 4,
            phrase_near_heading_exponent: 5,
            excluded_marker: "index".to_string(),
        }
    }
}

/// Query tf-idf against the combined statistics. Terms unknown to the index
/// get weight 0.
pub fn query_vector(terms: &[String], query: &str, index: &InvertedIndex, total_docs: usize) -> TermVector {
    let mut weights = BTreeMap::new();
    for term in terms {
        if weights.contains_key(term) { continue; }
        let Some(tf) = log_tf(count_occurrences(query, term)) else { continue };
        let w = if index.contains_term(term) { tf * idf(total_docs, index.df(term)) } else { 0.0 };
        weights.insert(term.clone(), w);
    }
    TermVector(weights)
}

/// 0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.0.len() <= b.0.len() { (a, b) } else { (b, a) };
    let dot: f64 = small.0.iter().map(|(t, w)| w * large.get(t)).sum();
    let ma = a.magnitude();
    let mb = b.magnitude();
    if ma == 0.0 || mb == 0.0 {
        return 0.0;
    }
    dot / (ma * mb)
}

/// Top `top_k` documents by similarity. The sort is stable, so ties keep the
/// vector space's (sorted id) order.
pub fn rank(vectors: &VectorSpace, query: &TermVector, top_k: usize) -> Vec<(DocId, f64)> {
    let mut scored: Vec<(DocId, f64)> = vectors
        .docs
        .iter()
        .map(|(doc, v)| (doc.clone(), cosine_similarity(v, query)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}

fn has_lone_sentinel(window: &[char], sentinel: char) -> bool {
    window.iter().enumerate().any(|(j, &c)| {
        c == sentinel
            && (j == 0 || window[j - 1] != sentinel)
            && window.get(j + 1) != Some(&sentinel)
    })
}

/// True when some occurrence of `needle` has a single (not doubled) sentinel
/// within `radius` characters of it.
pub fn near_heading(text: &str, needle: &str, sentinel: char, radius: usize) -> bool {
    let hay: Vec<char> = text.chars().collect();
    let pat: Vec<char> = needle.chars().collect();
    if pat.is_empty() || pat.len() > hay.len() {
        return false;
    }
    (0..=hay.len() - pat.len())
        .filter(|&i| hay[i..i + pat.len()] == pat[..])
        .any(|i| {
            let start = i.saturating_sub(radius);
            let end = (i + pat.len() + radius).min(hay.len());
            has_lone_sentinel(&hay[start..end], sentinel)
        })
}

/// Sub-terms used by the booster: shortest first, without the one that is the
/// whole query.
pub fn booster_terms(terms: &[String], query: &str) -> Vec<String> {
    let mut sorted = terms.to_vec();
    sorted.sort_by_key(|t| t.chars().count());
    if sorted.last().map(String::as_str) == Some(query) {
        sorted.pop();
    }
    sorted
}

fn weighted(len: usize, exponent: u32, count: u32) -> u64 {
    (len as u64).saturating_pow(exponent).saturating_mul(count as u64)
}

pub fn lexical_score(text: &str, query: &str, terms: &[String], cfg: &BoosterConfig) -> u64 {
    let mut score = 0u64;
    for term in terms {
        let count = count_occurrences(text, term);
        let exp = if near_heading(text, term, cfg.sentinel, cfg.radius) {
            cfg.term_near_heading_exponent
        } else {
            cfg.term_exponent
        };
        score = score.saturating_add(weighted(term.chars().count(), exp, count));
    }
    let count = count_occurrences(text, query);
    let exp = if near_heading(text, query, cfg.sentinel, cfg.radius) {
        cfg.phrase_near_heading_exponent
    } else {
        cfg.phrase_exponent
    };
    score.saturating_add(weighted(query.chars().count(), exp, count))
}

/// Re-ranks candidates by lexical score read from their extracted text under
/// `storage_root`, drops directory index pages and caps the list.
pub fn boost(
    candidates: &[DocId],
    query: &str,
    terms: &[String],
    storage_root: &Path,
    cfg: &BoosterConfig,
) -> Vec<(DocId, u64)> {
    let terms = booster_terms(terms, query);
    let mut scored: Vec<(DocId, u64)> = candidates
        .iter()
        .map(|doc| {
            let path = layout::doc_dir(storage_root, doc).join(CONTENT_FILE);
            let score = match fs::read_to_string(&path) {
                Ok(text) => lexical_score(&text, query, &terms, cfg),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "content missing, scoring 0");
                    0
                }
            };
            (doc.clone(), score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .filter(|(doc, _)| !doc.contains(&cfg.excluded_marker))
        .take(cfg.max_results)
        .collect()
}

/// Stateless per call; borrows the segmenter and a loaded combined space.
pub struct QueryEngine<'a> {
    segmenter: &'a Segmenter,
    space: &'a CombinedSpace,
    storage_root: PathBuf,
    booster: BoosterConfig,
}

impl<'a> QueryEngine<'a> {
    pub fn new(segmenter: &'a Segmenter, space: &'a CombinedSpace, storage_root: impl Into<PathBuf>) -> Self {
        Self { segmenter, space, storage_root: storage_root.into(), booster: BoosterConfig::default() }
    }

    pub fn with_booster(mut self, booster: BoosterConfig) -> Self {
        self.booster = booster;
        self
    }

    /// NFKC-normalized, trimmed query and its precise-mode terms; `None` when
    /// there is nothing to rank.
    fn prepare(&self, query: &str) -> Option<(String, Vec<String>)> {
        let query = query.nfkc().collect::<String>().trim().to_string();
        if query.is_empty() || self.space.vectors.is_empty() {
            return None;
        }
        let terms = self.segmenter.segment(&query, SegmentMode::Precise);
        Some((query, terms))
    }

    fn ranked(&self, query: &str, terms: &[String], top_k: usize) -> Vec<(DocId, f64)> {
        let qv = query_vector(terms, query, &self.space.index, self.space.vectors.len());
        rank(&self.space.vectors, &qv, top_k)
    }

    /// Stage 1 only: `(doc, similarity)` for the `top_k` closest documents.
    pub fn vector_candidates(&self, query: &str, top_k: usize) -> Vec<(DocId, f64)> {
        match self.prepare(query) {
            Some((query, terms)) => self.ranked(&query, &terms, top_k),
            None => Vec::new(),
        }
    }

    /// Ranked document ids, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<DocId> {
        let Some((query, terms)) = self.prepare(query) else { return Vec::new() };
        let candidates: Vec<DocId> = self.ranked(&query, &terms, top_k).into_iter().map(|(d, _)| d).collect();
        let boosted = boost(&candidates, &query, &terms, &self.storage_root, &self.booster);
        tracing::debug!(query = %query, terms = terms.len(), candidates = candidates.len(), results = boosted.len(), "query ranked");
        boosted.into_iter().map(|(d, _)| d).collect()
    }
}
