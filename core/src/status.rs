//! `build.json` (per-domain stage status) and `history.json` (built domain sets).

use crate::persist::{load_json, save_json};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn now() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tokenize,
    IiTc,
    TfIdf,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Tokenize, Stage::IiTc, Stage::TfIdf];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Tokenize => "tokenize",
            Stage::IiTc => "ii-tc",
            Stage::TfIdf => "tf-idf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Complete,
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub status: StageStatus,
    pub time: Option<String>,
}

/// `{domain: {stage: {status, time}}}` backed by one JSON file.
#[derive(Debug, Clone, Default)]
pub struct BuildStatus {
    path: PathBuf,
    domains: BTreeMap<String, BTreeMap<String, StageRecord>>,
}

impl BuildStatus {
    /// Missing file means nothing has been built yet.
    pub fn load(path: &Path) -> Result<Self> {
        let domains = if path.is_file() { load_json(path)? } else { BTreeMap::new() };
        Ok(Self { path: path.to_path_buf(), domains })
    }

    pub fn save(&self) -> Result<()> {
        save_json(&self.path, &self.domains)
    }

    pub fn record(&self, domain: &str, stage: Stage) -> Option<&StageRecord> {
        self.domains.get(domain)?.get(stage.as_str())
    }

    pub fn needs_run(&self, domain: &str, stage: Stage) -> bool {
        self.record(domain, stage).map_or(true, |r| r.status != StageStatus::Complete)
    }

    pub fn mark_complete(&mut self, domain: &str, stage: Stage) -> Result<()> {
        self.set(domain, stage, StageRecord { status: StageStatus::Complete, time: Some(now()) })?;
        tracing::info!(domain, stage = stage.as_str(), "stage complete");
        Ok(())
    }

    pub fn reset(&mut self, domain: &str, stage: Stage) -> Result<()> {
        self.set(domain, stage, StageRecord { status: StageStatus::Incomplete, time: None })
    }

    fn set(&mut self, domain: &str, stage: Stage, record: StageRecord) -> Result<()> {
        self.domains
            .entry(domain.to_string())
            .or_default()
            .insert(stage.as_str().to_string(), record);
        self.save()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub time: String,
    pub dict_path: PathBuf,
}

/// Domain-set key -> directory of its combined artifacts.
#[derive(Debug, Clone, Default)]
pub struct History {
    path: PathBuf,
    entries: BTreeMap<String, HistoryEntry>,
}

impl History {
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.is_file() { load_json(path)? } else { BTreeMap::new() };
        Ok(Self { path: path.to_path_buf(), entries })
    }

    pub fn lookup(&self, key: &str) -> Option<&HistoryEntry> {
        self.entries.get(key)
    }

    /// Inserts or refreshes the entry and writes the file.
    pub fn record(&mut self, key: &str, dict_path: &Path) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            HistoryEntry { time: now(), dict_path: dict_path.to_path_buf() },
        );
        save_json(&self.path, &self.entries)
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
