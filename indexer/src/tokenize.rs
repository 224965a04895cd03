use anyhow::Result;
use sift_core::extract::extract_file;
use sift_core::layout::{self, CONTENT_FILE, PAGE_FILE, SEGMENTED_FILE};
use sift_core::persist::{save_manifest, DomainPaths};
use sift_core::tokenizer::{join_terms, SegmentMode, Segmenter};
use sift_core::{Document, Manifest};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Extracts and segments every saved page of a domain, writing
/// `index_content.txt` / `index_segmented.txt` next to each `index.html`,
/// and records them in the domain manifest with paths relative to the domain
/// directory.
pub fn tokenize_domain(storage_root: &Path, domain: &DomainPaths, segmenter: &Segmenter) -> Result<Manifest> {
    let mut documents = Vec::new();
    if !domain.root.is_dir() {
        tracing::warn!(dir = %domain.root.display(), "domain directory missing, nothing to tokenize");
    }

    for entry in WalkDir::new(&domain.root).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || entry.file_name() != PAGE_FILE {
            continue;
        }
        let Some(dir) = entry.path().parent() else { continue };
        let Some(id) = layout::doc_id_for_dir(storage_root, dir) else {
            tracing::debug!(dir = %dir.display(), "page outside storage root");
            continue;
        };
        let text = match extract_file(entry.path()) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "extraction failed");
                continue;
            }
        };
        let terms = segmenter.segment(&text, SegmentMode::Search);

        fs::write(dir.join(CONTENT_FILE), &text)?;
        fs::write(dir.join(SEGMENTED_FILE), join_terms(&terms))?;
        let rel = dir.strip_prefix(&domain.root).unwrap_or(Path::new(""));
        documents.push(Document { id, text_path: rel.join(CONTENT_FILE), terms_path: rel.join(SEGMENTED_FILE) });
    }

    let manifest = Manifest::new(documents);
    save_manifest(domain, &manifest)?;
    tracing::info!(dir = %domain.root.display(), documents = manifest.documents.len(), "tokenized domain");
    Ok(manifest)
}
