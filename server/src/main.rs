use anyhow::Result;
use axum::Router;
use clap::Parser;
use sift_server::{build_app_from_config, PipelineConfig, DEFAULT_TOP_K};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Storage root for crawled pages and built artifacts
    #[arg(long, default_value = "./saved")]
    root: PathBuf,
    /// Directory of *.txt stopword lists (built-in list when omitted)
    #[arg(long)]
    stopwords: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Vector-space candidates passed to the lexical booster
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    #[arg(long, default_value_t = 32)]
    max_depth: u32,
    #[arg(long, default_value_t = 6)]
    workers: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut config = PipelineConfig::new(&args.root);
    config.stopwords = args.stopwords;
    config.crawl.max_depth = args.max_depth;
    config.crawl.max_workers = args.workers;
    let app: Router = build_app_from_config(config, args.top_k)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, root = %args.root.display(), "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
