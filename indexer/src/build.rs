use anyhow::Result;
use sift_core::index::IndexBuilder;
use sift_core::persist::{
    load_domain_index, load_manifest, save_combined, save_domain_index, save_vectors, CombinedPaths, DomainPaths,
};
use sift_core::tfidf::{self, CombinedSpace};
use sift_core::tokenizer::split_terms;
use sift_core::{InvertedIndex, Manifest, TermCounts, VectorSpace};
use std::fs;
use std::path::Path;

/// Inverted index and term counts for the manifest's documents, resolving
/// their paths against `domain_root`. Documents whose content or term file is
/// missing are skipped.
pub fn build_index(domain_root: &Path, manifest: &Manifest) -> Result<(InvertedIndex, TermCounts)> {
    let mut builder = IndexBuilder::new();
    for doc in &manifest.documents {
        let text_path = domain_root.join(&doc.text_path);
        let terms_path = domain_root.join(&doc.terms_path);
        if !text_path.is_file() || !terms_path.is_file() {
            tracing::debug!(doc = %doc.id, "missing content or terms, skipped");
            continue;
        }
        let text = fs::read_to_string(&text_path)?;
        let terms = split_terms(&fs::read_to_string(&terms_path)?);
        builder.add_document(&doc.id, &terms, &text);
    }
    Ok(builder.finish())
}

/// The `ii-tc` stage: manifest in, `inverted_index.json` + `term_counts.json` out.
pub fn index_domain(domain: &DomainPaths) -> Result<(InvertedIndex, TermCounts)> {
    let manifest = load_manifest(domain)?;
    let (index, counts) = build_index(&domain.root, &manifest)?;
    save_domain_index(domain, &index, &counts)?;
    tracing::info!(dir = %domain.root.display(), num_docs = counts.len(), num_terms = index.len(), "indexed domain");
    Ok((index, counts))
}

/// The `tf-idf` stage for one domain.
pub fn tfidf_domain(domain: &DomainPaths) -> Result<VectorSpace> {
    let (index, counts) = load_domain_index(domain)?;
    let vectors = tfidf::build_vectors(&index, &counts);
    save_vectors(&domain.tf_idf(), &vectors)?;
    tracing::info!(dir = %domain.root.display(), num_docs = vectors.len(), "built tf-idf vectors");
    Ok(vectors)
}

/// Merges the per-domain indexes into one combined space and persists it.
pub fn combine_domains(domains: &[DomainPaths], out: &CombinedPaths) -> Result<CombinedSpace> {
    let mut counts_list = Vec::with_capacity(domains.len());
    let mut index_list = Vec::with_capacity(domains.len());
    for d in domains {
        let (index, counts) = load_domain_index(d)?;
        index_list.push(index);
        counts_list.push(counts);
    }
    let space = tfidf::combine(&counts_list, &index_list);
    save_combined(out, &space)?;
    tracing::info!(
        out = %out.root.display(),
        domains = domains.len(),
        num_docs = space.vectors.len(),
        num_terms = space.index.len(),
        "combined domains"
    );
    Ok(space)
}
