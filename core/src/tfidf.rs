//! TF-IDF weighting.
//!
//! Per domain: `(1 + ln tc) * ln(N / (1 + df))`.
//! Combined across domains: `ln(1 + tc) * ln(N / (1 + df))` with `N` and `df`
//! taken over the union of all domains. The two tf forms differ on purpose and
//! are kept apart. A zero count means the term is absent and is never weighted.

use crate::{InvertedIndex, TermCounts, TermVector, VectorSpace};
use std::collections::BTreeMap;

/// Combined inverted index plus the vectors built against it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedSpace {
    pub index: InvertedIndex,
    pub vectors: VectorSpace,
}

pub fn idf(total_docs: usize, df: usize) -> f64 {
    (total_docs as f64 / (1.0 + df as f64)).ln()
}

/// `1 + ln(tc)`; `None` for a zero count.
pub fn log_tf(tc: u32) -> Option<f64> {
    (tc > 0).then(|| 1.0 + (tc as f64).ln())
}

/// `ln(1 + tc)`; `None` for a zero count.
pub fn smoothed_tf(tc: u32) -> Option<f64> {
    (tc > 0).then(|| (1.0 + tc as f64).ln())
}

pub fn build_vectors(index: &InvertedIndex, counts: &TermCounts) -> VectorSpace {
    let n = counts.len();
    let mut docs = BTreeMap::new();
    for (doc, dc) in &counts.docs {
        let mut weights = BTreeMap::new();
        for (term, &tc) in &dc.tc {
            if let Some(tf) = log_tf(tc) {
                weights.insert(term.clone(), tf * idf(n, index.df(term)));
            }
        }
        docs.insert(doc.clone(), TermVector(weights));
    }
    VectorSpace { docs }
}

pub fn combine(counts_list: &[TermCounts], index_list: &[InvertedIndex]) -> CombinedSpace {
    let mut index = InvertedIndex::new();
    for ii in index_list {
        index.merge(ii);
    }
    let n: usize = counts_list.iter().map(TermCounts::len).sum();

    let mut docs = BTreeMap::new();
    for counts in counts_list {
        for (doc, dc) in &counts.docs {
            let mut weights = BTreeMap::new();
            for (term, &tc) in &dc.tc {
                if let Some(tf) = smoothed_tf(tc) {
                    weights.insert(term.clone(), tf * idf(n, index.df(term)));
                }
            }
            docs.insert(doc.clone(), TermVector(weights));
        }
    }
    tracing::debug!(docs = docs.len(), terms = index.len(), "combined vector space");
    CombinedSpace { index, vectors: VectorSpace { docs } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;

    fn corpus() -> (InvertedIndex, TermCounts) {
        let mut b = IndexBuilder::new();
        b.add_document("a/1", &["rust", "crawler"], "rust rust rust crawler");
        b.add_document("a/2", &["rust"], "rust");
        b.add_document("a/3", &["index"], "index");
        b.add_document("a/4", &["query"], "query");
        b.finish()
    }

    #[test]
    fn per_domain_weight_matches_formula() {
        let (ii, tc) = corpus();
        let v = build_vectors(&ii, &tc);
        let expected = (1.0 + 3f64.ln()) * (4.0f64 / 3.0).ln();
        assert!((v.docs["a/1"].get("rust") - expected).abs() < 1e-12);
        let crawler = (1.0f64) * (4.0f64 / 2.0).ln();
        assert!((v.docs["a/1"].get("crawler") - crawler).abs() < 1e-12);
    }

    #[test]
    fn weights_are_finite_and_zero_counts_are_absent() {
        let (ii, mut tc) = corpus();
        tc.docs.get_mut("a/2").unwrap().tc.insert("ghost".into(), 0);
        let v = build_vectors(&ii, &tc);
        assert!(!v.docs["a/2"].0.contains_key("ghost"));
        assert!(v.docs.values().flat_map(|t| t.0.values()).all(|w| w.is_finite()));

        let c = combine(&[tc], &[ii]);
        assert!(!c.vectors.docs["a/2"].0.contains_key("ghost"));
        assert!(c.vectors.docs.values().flat_map(|t| t.0.values()).all(|w| w.is_finite()));
    }

    #[test]
    fn raising_a_count_never_lowers_the_weight() {
        let idf = idf(10, 2);
        assert!(idf > 0.0);
        let mut prev = f64::MIN;
        for tc in 1..50 {
            let w = log_tf(tc).unwrap() * idf;
            let s = smoothed_tf(tc).unwrap() * idf;
            assert!(w >= prev);
            assert!(s > 0.0);
            prev = w;
        }
    }

    #[test]
    fn combine_uses_union_statistics_and_smoothed_tf() {
        let mut a = IndexBuilder::new();
        a.add_document("a/1", &["rust"], "rust rust");
        a.add_document("a/2", &["tokio"], "tokio");
        let (ii_a, tc_a) = a.finish();
        let mut b = IndexBuilder::new();
        b.add_document("b/1", &["rust"], "rust");
        b.add_document("b/2", &["serde"], "serde");
        b.add_document("b/3", &["axum"], "axum");
        let (ii_b, tc_b) = b.finish();

        let c = combine(&[tc_a, tc_b], &[ii_a, ii_b]);
        assert_eq!(c.vectors.len(), 5);
        assert_eq!(c.index.df("rust"), 2);
        let expected = 3f64.ln() * (5.0f64 / 3.0).ln();
        assert!((c.vectors.docs["a/1"].get("rust") - expected).abs() < 1e-12);
    }
}
