use sift_core::layout::{CONTENT_FILE, PAGE_FILE, SEGMENTED_FILE};
use sift_core::persist::{load_manifest, load_vectors, StoragePaths};
use sift_core::status::{BuildStatus, Stage};
use sift_core::tokenizer::{Segmenter, Stopwords};
use sift_indexer::{build_domain, build_index, combine_domains, index_domain, tfidf_domain, tokenize_domain};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DOMAIN_A: &str = "https://lab.example.org";
const DOMAIN_B: &str = "http://news.example.org";

fn write_page(root: &Path, rel: &str, html: &str) {
    let dir = rel.split('/').fold(root.to_path_buf(), |p, s| p.join(s));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(PAGE_FILE), html).unwrap();
}

fn seed_storage(root: &Path) {
    write_page(
        root,
        "https_lab.example.org",
        "<html><head><title>Robotics Lab</title></head><body><h1>Robots</h1><p>We build robots and crawlers.</p></body></html>",
    );
    write_page(
        root,
        "https_lab.example.org/people",
        "<html><body><h2>People</h2><ul><li>Ada builds robots</li><li>Alan writes crawlers</li></ul></body></html>",
    );
    write_page(
        root,
        "http_news.example.org/2024/launch",
        "<html><body><h1>Launch</h1><p>The rover launch happened today.</p></body></html>",
    );
}

fn segmenter() -> Segmenter {
    Segmenter::new(Stopwords::builtin())
}

#[test]
fn tokenize_writes_content_terms_and_manifest() {
    let dir = tempdir().unwrap();
    seed_storage(dir.path());
    let storage = StoragePaths::new(dir.path());
    let domain = storage.domain(DOMAIN_A).unwrap();

    let manifest = tokenize_domain(dir.path(), &domain, &segmenter()).unwrap();
    let ids: Vec<&str> = manifest.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["https_lab.example.org", "https_lab.example.org/people"]);
    assert_eq!(load_manifest(&domain).unwrap(), manifest);

    let content = fs::read_to_string(domain.root.join(CONTENT_FILE)).unwrap();
    assert!(content.starts_with("#Robotics Lab\n\n#Robots#"));
    let terms = fs::read_to_string(domain.root.join(SEGMENTED_FILE)).unwrap();
    assert!(terms.split('/').any(|t| t == "robots"));
    assert!(!terms.split('/').any(|t| t == "We" || t == "and"));
}

#[test]
fn documents_missing_files_are_skipped() {
    let dir = tempdir().unwrap();
    seed_storage(dir.path());
    let storage = StoragePaths::new(dir.path());
    let domain = storage.domain(DOMAIN_A).unwrap();
    let manifest = tokenize_domain(dir.path(), &domain, &segmenter()).unwrap();

    fs::remove_file(domain.root.join("people").join(SEGMENTED_FILE)).unwrap();
    let (ii, tc) = build_index(&domain.root, &manifest).unwrap();
    assert_eq!(tc.len(), 1);
    assert!(tc.get("https_lab.example.org/people").is_none());
    assert!(ii.postings.values().all(|docs| !docs.contains("https_lab.example.org/people")));
}

#[test]
fn reindexing_unchanged_documents_is_byte_identical() {
    let dir = tempdir().unwrap();
    seed_storage(dir.path());
    let storage = StoragePaths::new(dir.path());
    let domain = storage.domain(DOMAIN_A).unwrap();
    tokenize_domain(dir.path(), &domain, &segmenter()).unwrap();

    index_domain(&domain).unwrap();
    let ii_first = fs::read(domain.inverted_index()).unwrap();
    let tc_first = fs::read(domain.term_counts()).unwrap();
    index_domain(&domain).unwrap();
    assert_eq!(fs::read(domain.inverted_index()).unwrap(), ii_first);
    assert_eq!(fs::read(domain.term_counts()).unwrap(), tc_first);

    let (ii, tc) = index_domain(&domain).unwrap();
    assert_eq!(ii.df("robots"), 2);
    assert_eq!(tc.get("https_lab.example.org").unwrap().tc["robots"], 1);
}

#[test]
fn manifest_survives_moving_the_storage_root() {
    let dir = tempdir().unwrap();
    let before = dir.path().join("saved");
    seed_storage(&before);
    let storage = StoragePaths::new(before.join("..").join("saved"));
    let manifest = tokenize_domain(&storage.root, &storage.domain(DOMAIN_A).unwrap(), &segmenter()).unwrap();
    assert!(manifest.documents.iter().all(|d| d.text_path.is_relative() && d.terms_path.is_relative()));
    assert_eq!(manifest.documents[1].text_path, Path::new("people").join(CONTENT_FILE));

    let after = dir.path().join("moved");
    fs::rename(&before, &after).unwrap();
    let (ii, tc) = index_domain(&StoragePaths::new(&after).domain(DOMAIN_A).unwrap()).unwrap();
    assert_eq!(tc.len(), 2);
    assert_eq!(ii.df("robots"), 2);
}

#[test]
fn build_domain_skips_completed_stages() {
    let dir = tempdir().unwrap();
    seed_storage(dir.path());
    let storage = StoragePaths::new(dir.path());
    build_domain(&storage, DOMAIN_A, &segmenter()).unwrap();

    let status = BuildStatus::load(&storage.build_status()).unwrap();
    for stage in Stage::ALL {
        assert!(!status.needs_run(DOMAIN_A, stage));
    }
    let domain = storage.domain(DOMAIN_A).unwrap();
    assert!(domain.tf_idf().is_file());

    // A page edited after tokenizing is not re-tokenized.
    let content_path = domain.root.join(CONTENT_FILE);
    let before = fs::read_to_string(&content_path).unwrap();
    write_page(dir.path(), "https_lab.example.org", "<p>changed</p>");
    build_domain(&storage, DOMAIN_A, &segmenter()).unwrap();
    assert_eq!(fs::read_to_string(&content_path).unwrap(), before);
}

#[test]
fn combining_domains_unions_documents() {
    let dir = tempdir().unwrap();
    seed_storage(dir.path());
    let storage = StoragePaths::new(dir.path());
    for d in [DOMAIN_A, DOMAIN_B] {
        build_domain(&storage, d, &segmenter()).unwrap();
    }
    let a = storage.domain(DOMAIN_A).unwrap();
    let b = storage.domain(DOMAIN_B).unwrap();
    let b_vectors = tfidf_domain(&b).unwrap();
    assert_eq!(b_vectors.len(), 1);
    assert_eq!(load_vectors(&b.tf_idf()).unwrap().docs.keys().collect::<Vec<_>>(), b_vectors.docs.keys().collect::<Vec<_>>());

    let out = storage.combined("test-key");
    let space = combine_domains(&[a, b], &out).unwrap();
    assert_eq!(space.vectors.len(), 3);
    assert!(space.index.df("launch") >= 1);
    assert!(out.exists());
    assert!(space.vectors.docs.values().flat_map(|v| v.0.values()).all(|w| w.is_finite()));
}
