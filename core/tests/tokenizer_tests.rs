use sift_core::tokenizer::{join_terms, SegmentMode, Segmenter, Stopwords, TERM_DELIMITER};
use std::fs;
use tempfile::tempdir;

#[test]
fn search_mode_adds_sub_terms_of_compounds() {
    let seg = Segmenter::new(Stopwords::builtin());
    let precise = seg.segment("中华人民共和国", SegmentMode::Precise);
    let search = seg.segment("中华人民共和国", SegmentMode::Search);
    assert_eq!(precise, vec!["中华人民共和国".to_string()]);
    assert!(search.len() > precise.len());
    assert!(search.contains(&"中华人民共和国".to_string()));
    assert!(search.contains(&"中华".to_string()));
}

#[test]
fn it_filters_stopwords_and_blanks() {
    let seg = Segmenter::new(Stopwords::builtin());
    let words = seg.segment("The quick brown fox and the lazy dog", SegmentMode::Precise);
    assert!(!words.contains(&"The".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(words.contains(&"fox".to_string()));
    assert!(words.iter().all(|w| !w.trim().is_empty()));
}

#[test]
fn terms_never_contain_the_delimiter() {
    let seg = Segmenter::new(Stopwords::default());
    let words = seg.segment("read/write and/or a/b testing", SegmentMode::Search);
    assert!(words.iter().all(|w| !w.contains(TERM_DELIMITER)));
    assert!(words.contains(&"read".to_string()));
    assert_eq!(join_terms(&words).split(TERM_DELIMITER).count(), words.len());
}

#[test]
fn it_loads_stopwords_from_a_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("cn.txt"), "的\n了\n").unwrap();
    fs::write(dir.path().join("en.txt"), "fox\n").unwrap();
    fs::write(dir.path().join("README.md"), "dog\n").unwrap();

    let sw = Stopwords::load_dir(dir.path()).unwrap();
    assert_eq!(sw.len(), 3);
    let seg = Segmenter::new(sw);
    let words = seg.segment("quick fox lazy dog", SegmentMode::Precise);
    assert!(!words.contains(&"fox".to_string()));
    assert!(words.contains(&"dog".to_string()));
}
