pub mod build;
pub mod tokenize;

pub use build::{build_index, combine_domains, index_domain, tfidf_domain};
pub use tokenize::tokenize_domain;

use anyhow::Result;
use sift_core::persist::StoragePaths;
use sift_core::status::{BuildStatus, Stage};
use sift_core::tokenizer::Segmenter;

/// Runs tokenize, ii-tc and tf-idf for `domain`, skipping stages that
/// `build.json` already marks complete.
pub fn build_domain(storage: &StoragePaths, domain: &str, segmenter: &Segmenter) -> Result<()> {
    let paths = storage.domain(domain)?;
    let mut status = BuildStatus::load(&storage.build_status())?;

    for stage in Stage::ALL {
        if !status.needs_run(domain, stage) {
            tracing::debug!(domain, stage = stage.as_str(), "already complete, skipped");
            continue;
        }
        match stage {
            Stage::Tokenize => {
                tokenize_domain(&storage.root, &paths, segmenter)?;
            }
            Stage::IiTc => {
                index_domain(&paths)?;
            }
            Stage::TfIdf => {
                tfidf_domain(&paths)?;
            }
        }
        status.mark_complete(domain, stage)?;
    }
    Ok(())
}
