use anyhow::Result;
use clap::{Parser, Subcommand};
use sift_core::layout::domain_set_key;
use sift_core::persist::StoragePaths;
use sift_core::status::History;
use sift_core::tokenizer::{Segmenter, Stopwords};
use sift_indexer::{build_domain, combine_domains, index_domain, tfidf_domain, tokenize_domain};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Tokenize crawled pages and build inverted index / TF-IDF artifacts", long_about = None)]
struct Cli {
    /// Storage root the crawler saved pages under
    #[arg(long, global = true, default_value = "./saved")]
    root: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and segment every saved page of a domain
    Tokenize {
        #[arg(long)]
        domain: String,
        /// Directory of *.txt stopword lists (built-in list when omitted)
        #[arg(long)]
        stopwords: Option<PathBuf>,
    },
    /// Build inverted index and term counts from the domain manifest
    Index {
        #[arg(long)]
        domain: String,
    },
    /// Build per-domain TF-IDF vectors
    TfIdf {
        #[arg(long)]
        domain: String,
    },
    /// Run every incomplete stage for a domain, recording progress in build.json
    Build {
        #[arg(long)]
        domain: String,
        #[arg(long)]
        stopwords: Option<PathBuf>,
    },
    /// Combine several built domains into one vector space under history/
    Combine {
        #[arg(long = "domain", required = true)]
        domains: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let storage = StoragePaths::new(&cli.root);

    match cli.command {
        Commands::Tokenize { domain, stopwords } => {
            let segmenter = Segmenter::new(Stopwords::from_source(stopwords.as_deref())?);
            tokenize_domain(&storage.root, &storage.domain(&domain)?, &segmenter)?;
        }
        Commands::Index { domain } => {
            index_domain(&storage.domain(&domain)?)?;
        }
        Commands::TfIdf { domain } => {
            tfidf_domain(&storage.domain(&domain)?)?;
        }
        Commands::Build { domain, stopwords } => {
            let segmenter = Segmenter::new(Stopwords::from_source(stopwords.as_deref())?);
            build_domain(&storage, &domain, &segmenter)?;
        }
        Commands::Combine { mut domains } => {
            domains.sort();
            domains.dedup();
            let key = domain_set_key(&domains);
            let out = storage.combined(&key);
            let paths = domains.iter().map(|d| storage.domain(d)).collect::<Result<Vec<_>>>()?;
            combine_domains(&paths, &out)?;
            History::load(&storage.history())?.record(&key, &out.root)?;
            tracing::info!(key = %key, "history updated");
        }
    }
    Ok(())
}
