use crate::layout;
use crate::tfidf::CombinedSpace;
use crate::{CrawlSnapshot, InvertedIndex, Manifest, TermCounts, VectorSpace};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Bumped whenever `CrawlSnapshot` changes shape.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Root of everything the pipeline writes.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub root: PathBuf,
}

impl StoragePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn build_status(&self) -> PathBuf { self.root.join("build.json") }
    pub fn history_dir(&self) -> PathBuf { self.root.join("history") }
    pub fn history(&self) -> PathBuf { self.history_dir().join("history.json") }
    pub fn combined(&self, key: &str) -> CombinedPaths { CombinedPaths::new(self.history_dir().join(key)) }
    pub fn domain(&self, domain: &str) -> Result<DomainPaths> {
        Ok(DomainPaths::new(layout::domain_dir(&self.root, domain)?))
    }
}

/// Artifacts of a single crawled domain.
#[derive(Debug, Clone)]
pub struct DomainPaths {
    pub root: PathBuf,
}

impl DomainPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn crawl_state(&self) -> PathBuf { self.root.join("crawler_state.bin") }
    pub fn manifest(&self) -> PathBuf { self.root.join("manifest.json") }
    pub fn inverted_index(&self) -> PathBuf { self.root.join("inverted_index.json") }
    pub fn term_counts(&self) -> PathBuf { self.root.join("term_counts.json") }
    pub fn tf_idf(&self) -> PathBuf { self.root.join("tf_idf.json") }
}

/// Artifacts of one domain-set combination.
#[derive(Debug, Clone)]
pub struct CombinedPaths {
    pub root: PathBuf,
}

impl CombinedPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn inverted_index(&self) -> PathBuf { self.root.join("combined_ii.json") }
    pub fn tf_idf(&self) -> PathBuf { self.root.join("tf_idf.json") }
    pub fn exists(&self) -> bool { self.inverted_index().is_file() && self.tf_idf().is_file() }
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let json = serde_json::to_vec_pretty(value)?;
    f.write_all(&json)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let value = serde_json::from_slice(&buf).with_context(|| format!("parsing {}", path.display()))?;
    Ok(value)
}

pub fn save_manifest(paths: &DomainPaths, manifest: &Manifest) -> Result<()> {
    save_json(&paths.manifest(), manifest)
}

pub fn load_manifest(paths: &DomainPaths) -> Result<Manifest> {
    let manifest: Manifest = load_json(&paths.manifest())?;
    if manifest.version != Manifest::VERSION {
        bail!("unsupported manifest version {} in {}", manifest.version, paths.manifest().display());
    }
    Ok(manifest)
}

pub fn save_domain_index(paths: &DomainPaths, index: &InvertedIndex, counts: &TermCounts) -> Result<()> {
    save_json(&paths.inverted_index(), index)?;
    save_json(&paths.term_counts(), counts)
}

pub fn load_domain_index(paths: &DomainPaths) -> Result<(InvertedIndex, TermCounts)> {
    Ok((load_json(&paths.inverted_index())?, load_json(&paths.term_counts())?))
}

pub fn save_vectors(path: &Path, vectors: &VectorSpace) -> Result<()> {
    save_json(path, vectors)
}

pub fn load_vectors(path: &Path) -> Result<VectorSpace> {
    load_json(path)
}

pub fn save_combined(paths: &CombinedPaths, space: &CombinedSpace) -> Result<()> {
    save_json(&paths.inverted_index(), &space.index)?;
    save_json(&paths.tf_idf(), &space.vectors)
}

pub fn load_combined(paths: &CombinedPaths) -> Result<CombinedSpace> {
    Ok(CombinedSpace {
        index: load_json(&paths.inverted_index())?,
        vectors: load_json(&paths.tf_idf())?,
    })
}

/// Writes `version (u32 LE) | bincode(snapshot)` through a temp file and rename;
/// a crash mid-write leaves the previous round's snapshot in place.
pub fn save_crawl_snapshot(path: &Path, snapshot: &CrawlSnapshot) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let mut bytes = SNAPSHOT_VERSION.to_le_bytes().to_vec();
    bytes.extend(bincode::serialize(snapshot)?);
    let tmp = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp)?;
        f.write_all(&bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// `Ok(None)` when no snapshot has been written yet.
pub fn load_crawl_snapshot(path: &Path) -> Result<Option<CrawlSnapshot>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    if bytes.len() < 4 {
        bail!("truncated crawl snapshot {}", path.display());
    }
    let (head, body) = bytes.split_at(4);
    let version = u32::from_le_bytes([head[0], head[1], head[2], head[3]]);
    if version != SNAPSHOT_VERSION {
        bail!("unsupported crawl snapshot version {version} in {}", path.display());
    }
    let snapshot = bincode::deserialize(body).with_context(|| format!("decoding {}", path.display()))?;
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UrlRecord;
    use tempfile::tempdir;

    #[test]
    fn snapshot_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crawler_state.bin");
        assert!(load_crawl_snapshot(&path).unwrap().is_none());

        let snap = CrawlSnapshot {
            visited: vec!["https://a.org/".into(), "https://a.org/x".into()],
            frontier: vec![UrlRecord::new("https://a.org/y", 2)],
        };
        save_crawl_snapshot(&path, &snap).unwrap();
        assert_eq!(load_crawl_snapshot(&path).unwrap(), Some(snap));
    }

    #[test]
    fn snapshot_with_unknown_version_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crawler_state.bin");
        let mut bytes = 99u32.to_le_bytes().to_vec();
        bytes.extend(bincode::serialize(&CrawlSnapshot::default()).unwrap());
        fs::write(&path, bytes).unwrap();
        let err = load_crawl_snapshot(&path).unwrap_err();
        assert!(err.to_string().contains("version 99"));
    }

    #[test]
    fn domain_paths_follow_url_layout() {
        let storage = StoragePaths::new("/data");
        let d = storage.domain("https://example.org").unwrap();
        assert_eq!(d.inverted_index(), PathBuf::from("/data/https_example.org/inverted_index.json"));
        assert_eq!(storage.combined("k").tf_idf(), PathBuf::from("/data/history/k/tf_idf.json"));
    }
}
