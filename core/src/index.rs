use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Page directory relative to the storage root, `/`-separated,
/// e.g. `https_example.org/news/2024`.
pub type DocId = String;

/// A URL waiting in (or taken from) the crawl frontier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UrlRecord {
    pub url: String,
    pub depth: u32,
}

impl UrlRecord {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self { url: url.into(), depth }
    }
}

/// Crawl progress persisted after every completed round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSnapshot {
    /// Sorted so snapshots of equal state are byte-identical.
    pub visited: Vec<String>,
    pub frontier: Vec<UrlRecord>,
}

/// One tokenized page as produced by the tokenize stage. Paths are relative
/// to the domain directory the manifest lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text_path: PathBuf,
    pub terms_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub documents: Vec<Document>,
}

impl Manifest {
    pub const VERSION: u32 = 1;

    pub fn new(mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Self { version: Self::VERSION, documents }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingList(pub BTreeSet<DocId>);

impl PostingList {
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn contains(&self, doc: &str) -> bool { self.0.contains(doc) }
    pub fn iter(&self) -> impl Iterator<Item = &DocId> { self.0.iter() }
}

/// term -> documents containing it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    pub postings: BTreeMap<String, PostingList>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, term: &str, doc: &str) {
        self.postings.entry(term.to_string()).or_default().0.insert(doc.to_string());
    }

    /// Document frequency; 0 for unknown terms.
    pub fn df(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, PostingList::len)
    }

    pub fn contains_term(&self, term: &str) -> bool { self.postings.contains_key(term) }

    /// Set union per term.
    pub fn merge(&mut self, other: &InvertedIndex) {
        for (term, docs) in &other.postings {
            self.postings.entry(term.clone()).or_default().0.extend(docs.iter().cloned());
        }
    }

    pub fn len(&self) -> usize { self.postings.len() }
    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCounts {
    pub tc: BTreeMap<String, u32>,
}

/// doc id -> raw occurrence counts of its segmented terms in its extracted text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermCounts {
    pub docs: BTreeMap<DocId, DocumentCounts>,
}

impl TermCounts {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
    pub fn get(&self, doc: &str) -> Option<&DocumentCounts> { self.docs.get(doc) }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermVector(pub BTreeMap<String, f64>);

impl TermVector {
    pub fn get(&self, term: &str) -> f64 { self.0.get(term).copied().unwrap_or(0.0) }
    pub fn magnitude(&self) -> f64 { self.0.values().map(|w| w * w).sum::<f64>().sqrt() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// doc id -> TF-IDF vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorSpace {
    pub docs: BTreeMap<DocId, TermVector>,
}

impl VectorSpace {
    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
    pub fn get(&self, doc: &str) -> Option<&TermVector> { self.docs.get(doc) }
}

/// Non-overlapping occurrences of `term` in `text`, matching how term counts are defined.
pub fn count_occurrences(text: &str, term: &str) -> u32 {
    if term.is_empty() { return 0; }
    text.matches(term).count() as u32
}

/// Accumulates the inverted index and term counts for a set of documents.
/// Both maps are filled from the same loop, so a document appears in a term's
/// posting list iff that term has a non-zero count for it.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: InvertedIndex,
    counts: TermCounts,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn add_document<S: AsRef<str>>(&mut self, doc: &str, terms: &[S], text: &str) {
        let mut tc = BTreeMap::new();
        for term in terms {
            let term = term.as_ref();
            if term.trim().is_empty() || tc.contains_key(term) { continue; }
            let count = count_occurrences(text, term);
            if count == 0 { continue; }
            tc.insert(term.to_string(), count);
            self.index.add(term, doc);
        }
        self.counts.docs.insert(doc.to_string(), DocumentCounts { tc });
    }

    pub fn finish(self) -> (InvertedIndex, TermCounts) { (self.index, self.counts) }
}
