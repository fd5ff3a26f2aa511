//! Sumi-Crawl main entry point
//!
//! This is the command-line interface for the Sumi-Crawl site crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_crawl::config::{read_config, validate, Config};
use sumi_crawl::crawler::crawl;
use sumi_crawl::output::log_summary;
use sumi_crawl::RecordFormat;
use tracing_subscriber::EnvFilter;

/// Sumi-Crawl: a bounded-concurrency site crawler
///
/// Crawls every page reachable from the seed URL on the seed's host and
/// prints one record per page with all the links found on it. Logs go to
/// stderr; records go to stdout.
#[derive(Parser, Debug)]
#[command(name = "sumi-crawl")]
#[command(version)]
#[command(about = "A bounded-concurrency site crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(short, long, env = "URL")]
    url: Option<String>,

    /// Number of concurrent fetch workers
    #[arg(short, long, env = "WORKERS")]
    workers: Option<usize>,

    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    user_agent: Option<String>,

    /// Capacity of the frontier and result channels
    #[arg(long)]
    channel_capacity: Option<usize>,

    /// Page record format
    #[arg(long, value_enum)]
    format: Option<RecordFormat>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Layers command-line values over the file (or default) configuration
    fn apply(self, mut config: Config) -> Config {
        if let Some(url) = self.url {
            config.crawler.seed_url = url;
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(capacity) = self.channel_capacity {
            config.crawler.channel_capacity = capacity;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.http.timeout_ms = timeout_ms;
        }
        if let Some(user_agent) = self.user_agent {
            config.http.user_agent = user_agent;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            read_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };
    let config = cli.apply(config);
    validate(&config).context("invalid configuration")?;

    tracing::info!(
        "Crawling {} with {} workers (timeout {}ms)",
        config.crawler.seed_url,
        config.crawler.workers,
        config.http.timeout_ms
    );

    match crawl(&config, tokio::io::stdout()).await {
        Ok(summary) => {
            log_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).with_context(|| format!("error crawling {}", config.crawler.seed_url))
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs are written to stderr so stdout carries only page records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_crawl=info,warn"),
            1 => EnvFilter::new("sumi_crawl=debug,info"),
            2 => EnvFilter::new("sumi_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
