//! Crawler module for concurrent site crawling
//!
//! This module contains the crawl engine, including:
//! - HTTP fetching behind the [`HttpFetch`] capability
//! - HTML parsing and link extraction
//! - The worker pool and the fan-in of its output
//! - The dispatcher that owns the frontier and detects termination
//! - The result loop that drives everything

mod coordinator;
mod dispatcher;
mod fetcher;
mod memory;
mod merge;
mod parser;
mod worker;

pub use coordinator::Crawler;
pub use dispatcher::{Dispatcher, DispatcherState};
pub use fetcher::{
    build_http_client, fetch_page, BodyStream, FetchResponse, HttpFetch, ReqwestFetcher,
    TransportError,
};
pub use memory::StaticSite;
pub use merge::fan_in;
pub use parser::{extract_links, resolve_link};

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::{ConfigError, CrawlError};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;
use url::Url;

/// A crawled page and every link found on it
///
/// Links keep document order and may contain duplicates and off-host URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: Url,
    pub links: Vec<Url>,
}

/// Runs a complete crawl from configuration
///
/// This is the main entry point used by the binary. It will:
/// 1. Validate the configuration
/// 2. Build the HTTP client
/// 3. Crawl from the configured seed, writing records to `sink`
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `sink` - Where page records are written
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - The crawl drained
/// * `Err(CrawlError)` - The seed did not parse, configuration was invalid, or a
///   fatal error occurred
pub async fn crawl<W>(config: &Config, sink: W) -> Result<CrawlSummary, CrawlError>
where
    W: AsyncWrite + Unpin,
{
    crate::config::validate(config)?;

    let fetcher = ReqwestFetcher::new(&config.http).map_err(ConfigError::HttpClient)?;

    Crawler::from_config(&config.crawler, fetcher)
        .with_format(config.output.format)
        .crawl(&config.crawler.seed_url, sink)
        .await
}
