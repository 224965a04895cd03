use anyhow::Result;
use clap::Parser;
use sift_crawler::fetch::{DEFAULT_USER_AGENT, Fetcher};
use sift_crawler::{CrawlOptions, Crawler};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Resumable breadth-first crawl of one domain into the storage root")]
struct Cli {
    /// URL the crawl starts from
    #[arg(long)]
    seed: String,
    /// Only URLs starting with this prefix are followed (defaults to the seed)
    #[arg(long)]
    domain: Option<String>,
    /// Storage root pages are saved under
    #[arg(long, default_value = "./saved")]
    root: PathBuf,
    /// Maximum BFS depth from the seed
    #[arg(long, default_value_t = 32)]
    max_depth: u32,
    /// Concurrency (number of workers)
    #[arg(long, default_value_t = 6)]
    workers: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    /// Pause after each completed fetch, in milliseconds
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
    /// Stop after this many rounds (resume by running again)
    #[arg(long)]
    max_rounds: Option<usize>,
    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();
    let domain = args.domain.clone().unwrap_or_else(|| args.seed.clone());

    let fetcher = Fetcher::new(&args.user_agent, Duration::from_secs(args.timeout_secs))?;
    let options = CrawlOptions {
        max_depth: args.max_depth,
        max_workers: args.workers,
        politeness_delay: Duration::from_millis(args.delay_ms),
        max_rounds: args.max_rounds,
    };
    tracing::info!(seed = %args.seed, domain = %domain, root = %args.root.display(), "crawl starting");

    let report = Crawler::new(fetcher, options).crawl(&args.seed, &domain, &args.root).await?;
    tracing::info!(
        rounds = report.rounds,
        fetched = report.fetched,
        visited = report.visited,
        frontier = report.frontier,
        "crawl finished"
    );
    Ok(())
}
